use lachesis_node::config::ProxyConfig;
use lachesis_node::errors::ProxyError;
use lachesis_node::inmem::InmemAppProxy;
use lachesis_node::proxy::AppProxy;
use lachesis_proxy::{Block, StateError, StateHash};
use tokio::time::{timeout, Duration};
use tokio_stream::StreamExt;

fn make_blocks(n: u64) -> Vec<Block> {
    (0..n)
        .map(|i| {
            Block::new(
                i,
                i + 1,
                vec![],
                vec![format!("block {} transaction", i).into_bytes()],
            )
        })
        .collect()
}

#[tokio::test]
async fn test_commit_snapshot_restore() {
    let proxy = InmemAppProxy::new(&ProxyConfig::default());
    let initial = proxy.state_hash().await;
    assert_eq!(initial, StateHash::GENESIS);

    let blocks = make_blocks(5);
    let state_hash = proxy.commit_block(blocks[0].clone()).await.unwrap();

    let expected = initial.advance(b"block 0 transaction");
    assert_eq!(state_hash, expected);

    let snapshot = proxy.get_snapshot(0).await.unwrap();
    assert_eq!(snapshot.as_bytes(), expected.as_bytes());

    for block in blocks[1..].iter() {
        proxy.commit_block(block.clone()).await.unwrap();
    }
    assert_ne!(proxy.state_hash().await, expected);

    proxy.restore(snapshot).await.unwrap();
    assert_eq!(proxy.state_hash().await, expected);
}

#[tokio::test]
async fn test_skipped_index_is_sequencing_error() {
    let proxy = InmemAppProxy::new(&ProxyConfig::default());
    let blocks = make_blocks(3);
    proxy.commit_block(blocks[0].clone()).await.unwrap();
    let before = proxy.state_hash().await;

    let err = proxy.commit_block(blocks[2].clone()).await.unwrap_err();
    assert!(matches!(err, ProxyError::Sequencing { expected: 1, got: 2 }));
    assert!(!err.is_transport());
    assert_eq!(proxy.state_hash().await, before);
}

#[tokio::test]
async fn test_missing_snapshot_is_application_error() {
    let proxy = InmemAppProxy::new(&ProxyConfig::default());
    let err = proxy.get_snapshot(3).await.unwrap_err();
    assert!(matches!(
        err,
        ProxyError::Application(StateError::SnapshotNotFound(3))
    ));
}

#[tokio::test]
async fn test_restore_twice_is_same_as_once() {
    let proxy = InmemAppProxy::new(&ProxyConfig::default());
    for block in make_blocks(4) {
        proxy.commit_block(block).await.unwrap();
    }
    let snapshot = proxy.get_snapshot(1).await.unwrap();

    proxy.restore(snapshot.clone()).await.unwrap();
    let once = proxy.state_hash().await;
    proxy.restore(snapshot).await.unwrap();
    assert_eq!(proxy.state_hash().await, once);
}

#[tokio::test]
async fn test_local_submission_reaches_stream() {
    let proxy = InmemAppProxy::new(&ProxyConfig::default());
    let mut stream = proxy.take_submit_stream().unwrap();
    assert!(proxy.take_submit_stream().is_none());

    let producers: Vec<_> = (0..4u8)
        .map(|i| {
            let submitter = proxy.submitter();
            tokio::spawn(async move { submitter.submit(vec![i]).await })
        })
        .collect();
    proxy.submit_tx(b"local".to_vec()).await.unwrap();
    for p in producers {
        p.await.unwrap().unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..5 {
        let tx = timeout(Duration::from_millis(200), stream.next())
            .await
            .unwrap()
            .unwrap();
        seen.push(tx);
    }
    seen.sort();
    assert_eq!(
        seen,
        vec![vec![0], vec![1], vec![2], vec![3], b"local".to_vec()]
    );
}

#[tokio::test]
async fn test_committed_transactions_in_order() {
    let proxy = InmemAppProxy::new(&ProxyConfig::default());
    let block = Block::new(0, 1, vec![], vec![b"a".to_vec(), b"b".to_vec()]);
    proxy.commit_block(block).await.unwrap();
    proxy
        .commit_block(Block::new(1, 2, vec![], vec![b"c".to_vec()]))
        .await
        .unwrap();

    assert_eq!(
        proxy.committed_transactions().await,
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
    );
}
