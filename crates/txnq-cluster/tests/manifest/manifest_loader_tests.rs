//! Integration tests for loading manifests from disk into a metadata cache.

use std::fs;
use tempfile::TempDir;
use test_log::test;
use txnq_cluster::{
    ClusterError, InMemoryMetadataCache, MetadataCache,
    manifest::ManifestLoader,
    types::*,
};

const YAML_MANIFEST: &str = r#"
brokers:
  - id: 1
    listeners:
      - name: PLAINTEXT
        host: 127.0.0.1
        port: 9092
      - name: INTERNAL
        host: 10.0.0.1
        port: 19092
  - id: 2
    listeners:
      - name: PLAINTEXT
        host: 127.0.0.1
        port: 9093
topics:
  payments:
    partitions:
      - id: 0
        leader: 1
        replicas: [1, 2]
        epoch: 7
      - id: 1
        leader: 2
        replicas: [1, 2]
      - id: 2
        replicas: [1, 2]
"#;

fn write_manifest(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_yaml_manifest_builds_usable_cache() {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(&dir, "cluster.yaml", YAML_MANIFEST);

    let manifest = ManifestLoader::from_path(&path).unwrap();
    let cache = InMemoryMetadataCache::new_with_manifest(manifest).unwrap();

    assert_eq!(
        cache
            .get_partition_leader("payments", PartitionId::new(0))
            .unwrap(),
        Some(BrokerId(1))
    );
    assert_eq!(
        cache
            .get_partition_epoch("payments", PartitionId::new(1))
            .unwrap(),
        Epoch(0)
    );
    assert_eq!(
        cache
            .get_partition_leader("payments", PartitionId::new(2))
            .unwrap(),
        None
    );

    let internal = cache
        .get_alive_endpoint(BrokerId(1), &ListenerName::new("INTERNAL"))
        .unwrap();
    assert_eq!(internal.address(), "10.0.0.1:19092");
}

#[test]
fn test_unknown_extension_falls_back_to_yaml() {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(&dir, "cluster.manifest", YAML_MANIFEST);

    let manifest = ManifestLoader::from_path(&path).unwrap();
    assert_eq!(manifest.brokers.len(), 2);
}

#[test]
fn test_malformed_manifest_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(&dir, "broken.json", "{ \"brokers\": [ { \"id\": ");

    let result = ManifestLoader::from_path(&path);
    assert!(matches!(result, Err(ClusterError::InvalidManifest { .. })));
}

#[test]
fn test_manifest_with_dangling_replica_is_rejected() {
    let dir = TempDir::new().unwrap();
    let content = YAML_MANIFEST.replace(
        "replicas: [1, 2]\n        epoch: 7",
        "replicas: [1, 3]\n        epoch: 7",
    );
    let path = write_manifest(&dir, "dangling.yml", &content);

    let err = ManifestLoader::from_path(&path).unwrap_err();
    assert!(err.is_client_error());
}
