use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use txnq_cluster::{
    manifest::{BrokerSpec, ClusterManifest, ManifestLoader, PartitionAssignment, TopicAssignment},
    types::{BrokerId, Epoch, PartitionId, TopicPartition},
};
use txnq_coordinator::{
    ChannelConfig, MarkerErrorKind, PartitionMarkerResult, TransactionMarkerChannel, telemetry,
    transaction::{ProducerEpoch, ProducerId, TransactionMetadata, TransactionState},
};

#[derive(Parser, Debug)]
#[command(
    name = "txnq-sim",
    version,
    author,
    about = "Drive the transaction marker channel against a simulated cluster"
)]
struct Args {
    /// Cluster manifest file path (JSON or YAML); a three-broker cluster is used when omitted
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Channel config file path (JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of transactions to complete
    #[arg(long, default_value_t = 20)]
    transactions: i64,

    /// Partitions touched by each transaction
    #[arg(long, default_value_t = 3)]
    partitions_per_txn: usize,

    /// Number of coordinator partitions transactions are spread over
    #[arg(long, default_value_t = 4)]
    coordinator_partitions: u32,

    /// Coordinator partition to emigrate after routing
    #[arg(long)]
    emigrate: Option<u32>,

    /// Sender poll interval in milliseconds
    #[arg(long, default_value_t = 50)]
    drain_interval_ms: u64,
}

fn demo_manifest() -> ClusterManifest {
    let brokers = (1..=3u32)
        .map(|id| BrokerSpec::plaintext(id, "127.0.0.1", 9091 + id as u16))
        .collect();
    let partitions = (0..6)
        .map(|p| PartitionAssignment {
            id: PartitionId::new(p),
            leader: Some(BrokerId(p % 3 + 1)),
            replicas: vec![BrokerId(1), BrokerId(2), BrokerId(3)],
            epoch: Epoch(0),
        })
        .collect();

    ClusterManifest {
        brokers,
        topics: [("orders".to_string(), TopicAssignment { partitions })]
            .into_iter()
            .collect(),
    }
}

fn all_partitions(manifest: &ClusterManifest) -> Vec<TopicPartition> {
    let mut partitions: Vec<TopicPartition> = manifest
        .topics
        .iter()
        .flat_map(|(topic, assignment)| {
            assignment
                .partitions
                .iter()
                .map(move |p| TopicPartition::new(topic.clone(), p.id))
        })
        .collect();
    partitions.sort();
    partitions
}

/// Drains one broker's queue on every tick and acknowledges each partition write.
async fn run_sender(
    channel: Arc<TransactionMarkerChannel>,
    broker_id: BrokerId,
    interval: Duration,
    results: mpsc::UnboundedSender<(PartitionId, PartitionMarkerResult)>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        for batch in channel.drain_queue(broker_id) {
            tracing::info!(
                %broker_id,
                metadata_partition = %batch.metadata_partition,
                coordinator_epoch = %batch.coordinator_epoch,
                partitions = batch.partition_count(),
                "Sending marker batch"
            );
            for entry in &batch.entries {
                for tp in &entry.topic_partitions {
                    let result = PartitionMarkerResult::new(
                        entry.producer_id,
                        tp.clone(),
                        MarkerErrorKind::None,
                    );
                    if results.send((batch.metadata_partition, result)).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let args = Args::parse();

    let manifest = match &args.manifest {
        Some(path) => ManifestLoader::from_path(path)?,
        None => demo_manifest(),
    };
    let config = match &args.config {
        Some(path) => ChannelConfig::from_path(path)?,
        None => ChannelConfig::default(),
    };

    let partitions = all_partitions(&manifest);
    if partitions.is_empty() {
        return Err("manifest defines no partitions".into());
    }

    let channel = Arc::new(TransactionMarkerChannel::from_manifest(config, manifest)?);
    let coordinator_epoch = Epoch(1);

    // Outstanding partition acknowledgements per (coordinator partition, producer).
    let mut outstanding: HashMap<(PartitionId, ProducerId), usize> = HashMap::new();

    for i in 0..args.transactions {
        let producer_id = ProducerId(1000 + i);
        let metadata_partition = PartitionId::new(i as u32 % args.coordinator_partitions.max(1));
        let touched: BTreeSet<TopicPartition> = (0..args.partitions_per_txn)
            .map(|k| partitions[(i as usize + k) % partitions.len()].clone())
            .collect();

        let state = if i % 5 == 0 {
            TransactionState::PrepareAbort
        } else {
            TransactionState::PrepareCommit
        };
        let txn =
            TransactionMetadata::new(format!("sim-{i}"), producer_id, ProducerEpoch(0), 60_000)
                .with_partitions(touched)
                .with_state(state);

        let report = channel.add_txn_markers_to_send(metadata_partition, coordinator_epoch, &txn)?;
        let queued: usize = report.enqueued.iter().map(|(_, n)| n).sum();
        if queued > 0 {
            outstanding.insert((metadata_partition, producer_id), queued);
        }
    }

    tracing::info!(
        queued = channel.broker_registry().total_queued(),
        pending = channel.pending_registry().len(),
        "Routed {} transactions",
        args.transactions
    );

    if let Some(partition) = args.emigrate {
        let report = channel.remove_state_for_partition(PartitionId::new(partition));
        outstanding.retain(|(p, _), _| p.as_u32() != partition);
        tracing::info!(
            pending_removed = report.pending_removed.len(),
            batches_removed = report.batches_removed,
            "Emigrated coordinator partition {partition}"
        );
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let interval = Duration::from_millis(args.drain_interval_ms.max(1));
    let senders: Vec<_> = channel
        .broker_registry()
        .broker_ids()
        .into_iter()
        .map(|broker_id| tokio::spawn(run_sender(channel.clone(), broker_id, interval, tx.clone())))
        .collect();
    drop(tx);

    while !outstanding.is_empty() {
        let Some((metadata_partition, result)) = rx.recv().await else {
            break;
        };
        if !result.outcome.is_success() {
            tracing::warn!(?result, "Marker write failed");
            continue;
        }

        let key = (metadata_partition, result.producer_id);
        if let Some(remaining) = outstanding.get_mut(&key) {
            *remaining -= 1;
            if *remaining == 0 {
                outstanding.remove(&key);
                channel.remove_pending_request(metadata_partition, result.producer_id);
                tracing::debug!(producer_id = %result.producer_id, "Transaction markers complete");
            }
        }
    }

    for sender in senders {
        sender.abort();
    }

    tracing::info!(
        pending = channel.pending_registry().len(),
        queued = channel.broker_registry().total_queued(),
        "Simulation finished"
    );
    Ok(())
}
