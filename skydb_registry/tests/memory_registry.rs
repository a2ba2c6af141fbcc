use skydb_core::testutil::RegistryTransportTests;
use skydb_registry::MemoryRegistry;

#[tokio::test]
async fn memory_registry_conformance() {
    let registry = MemoryRegistry::new();
    RegistryTransportTests::new(&registry)
        .run_all()
        .await
        .expect("memory registry passes the transport suite");
}

#[tokio::test]
async fn memory_registry_rejects_bad_signatures() {
    use bytes::Bytes;
    use skydb_core::{DataKey, Keypair, RegistryTransport, TransportError};

    let registry = MemoryRegistry::new();
    let keypair = Keypair::derive(b"owner");
    let suite = RegistryTransportTests::with_keypair(&registry, keypair);
    let mut request = suite.signed_request(&DataKey::from("k"), b"data", 1);
    request.signature = Bytes::from(vec![0u8; 64]);

    let result = registry.publish(request).await;
    assert!(matches!(result, Err(TransportError::Other(_))));
    assert!(registry.is_empty());
}
