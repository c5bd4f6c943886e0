//! Ordered send behavior of `MessageSocket` over a scripted transport.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::future::join_all;
use ordered_websocket::{CloseStatus, Error, MessageKind, MessageSocket, SocketState, WebSocket};
use tokio_util::sync::CancellationToken;

use common::{MockTransport, SentFrame, init_tracing};

fn payload(i: usize) -> Vec<u8> {
    format!("frame-{i:02}").into_bytes()
}

#[tokio::test]
async fn test_sends_reach_transport_in_enqueue_order() -> Result<()> {
    init_tracing();
    let transport = MockTransport::new()
        .with_send_delay(Duration::from_millis(2))
        .into_arc();
    let socket = MessageSocket::new(transport.clone());
    let cancel = CancellationToken::new();

    let tasks: Vec<_> = (0..20)
        .map(|i| socket.send_binary(&payload(i), true, &cancel))
        .collect();
    for result in join_all(tasks).await {
        result?;
    }

    let expected: Vec<_> = (0..20).map(payload).collect();
    assert_eq!(transport.sent_payloads(), expected);
    assert_eq!(transport.overlaps(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_never_overlap() -> Result<()> {
    let transport = MockTransport::new()
        .with_send_delay(Duration::from_millis(1))
        .into_arc();
    let socket = Arc::new(MessageSocket::new(transport.clone()));

    let producers: Vec<_> = (0..4u8)
        .map(|producer| {
            let socket = Arc::clone(&socket);
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                let tasks: Vec<_> = (0..10u8)
                    .map(|seq| socket.send_binary(&[producer, seq], true, &cancel))
                    .collect();
                join_all(tasks).await
            })
        })
        .collect();

    for producer in producers {
        for result in producer.await? {
            result?;
        }
    }

    let sent = transport.sent_payloads();
    assert_eq!(sent.len(), 40);
    assert_eq!(transport.overlaps(), 0);

    // Each producer's frames keep their relative order.
    for producer in 0..4u8 {
        let seqs: Vec<u8> = sent
            .iter()
            .filter(|frame| frame[0] == producer)
            .map(|frame| frame[1])
            .collect();
        assert_eq!(seqs, (0..10).collect::<Vec<_>>());
    }
    Ok(())
}

#[tokio::test]
async fn test_failed_send_does_not_block_later_sends() -> Result<()> {
    let transport = MockTransport::new().failing_on(&payload(2)).into_arc();
    let socket = MessageSocket::new(transport.clone());
    let cancel = CancellationToken::new();

    let tasks: Vec<_> = (0..5)
        .map(|i| socket.send_text(&payload(i), true, &cancel))
        .collect();
    let results = join_all(tasks).await;

    for (i, result) in results.iter().enumerate() {
        if i == 2 {
            assert!(matches!(result, Err(Error::Transport { .. })));
        } else {
            assert!(result.is_ok(), "send {i} failed: {result:?}");
        }
    }
    assert_eq!(transport.sent().len(), 5);
    assert_eq!(socket.state(), SocketState::Open);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_queued_send_is_skipped() -> Result<()> {
    let transport = MockTransport::new().gated().into_arc();
    let socket = MessageSocket::new(transport.clone());
    let shared = CancellationToken::new();
    let cancelled = CancellationToken::new();

    let first = socket.send_text(b"first", true, &shared);
    let skipped = socket.send_text(b"skipped", true, &cancelled);
    let last = socket.send_text(b"last", true, &shared);

    // The first send is now parked inside the transport.
    cancelled.cancel();
    transport.release(2);

    assert!(first.await.is_ok());
    assert!(matches!(skipped.await, Err(Error::Cancelled)));
    assert!(last.await.is_ok());

    assert_eq!(
        transport.sent_payloads(),
        vec![b"first".to_vec(), b"last".to_vec()]
    );
    Ok(())
}

#[tokio::test]
async fn test_send_passes_opcode_and_final_flag() -> Result<()> {
    let transport = MockTransport::new().into_arc();
    let socket = MessageSocket::new(transport.clone());
    let cancel = CancellationToken::new();

    let text = socket.send_text(b"he", false, &cancel);
    let binary = socket.send_binary(b"llo", true, &cancel);
    let close = socket.send(&[0x03, 0xe8], MessageKind::Close, true, &cancel);
    text.await?;
    binary.await?;
    close.await?;

    assert_eq!(
        transport.sent(),
        vec![
            SentFrame {
                data: b"he".to_vec(),
                opcode: 0x1,
                is_final: false,
            },
            SentFrame {
                data: b"llo".to_vec(),
                opcode: 0x2,
                is_final: true,
            },
            SentFrame {
                data: vec![0x03, 0xe8],
                opcode: 0x8,
                is_final: true,
            },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_payload_is_copied_at_enqueue() -> Result<()> {
    let transport = MockTransport::new().gated().into_arc();
    let socket = MessageSocket::new(transport.clone());
    let cancel = CancellationToken::new();

    let blocker = socket.send_binary(b"blocker", true, &cancel);
    let mut buffer = b"original".to_vec();
    let queued = socket.send_binary(&buffer, true, &cancel);
    buffer.copy_from_slice(b"mutated!");

    transport.release(2);
    blocker.await?;
    queued.await?;

    assert_eq!(transport.sent_payloads()[1], b"original");
    Ok(())
}

#[tokio::test]
async fn test_close_does_not_wait_for_queue() -> Result<()> {
    let transport = MockTransport::new().gated().into_arc();
    let socket = MessageSocket::new(transport.clone());
    let cancel = CancellationToken::new();

    let tasks: Vec<_> = (0..3)
        .map(|i| socket.send_text(&payload(i), true, &cancel))
        .collect();
    tokio::task::yield_now().await;

    socket
        .close(CloseStatus::NormalClosure, "shutting down", &cancel)
        .await?;

    assert_eq!(transport.closes(), vec![(1000, "shutting down".to_owned())]);
    assert_eq!(transport.completed(), 0);
    assert_eq!(socket.state(), SocketState::Closed);

    // Items queued before the close still drain in order.
    transport.release(3);
    for result in join_all(tasks).await {
        result?;
    }
    assert_eq!(
        transport.sent_payloads(),
        (0..3).map(payload).collect::<Vec<_>>()
    );

    let late = socket.send_text(b"late", true, &cancel).await;
    assert!(matches!(late, Err(Error::ConnectionClosed)));
    Ok(())
}

#[tokio::test]
async fn test_failed_close_leaves_socket_open() -> Result<()> {
    let transport = MockTransport::new().failing_close().into_arc();
    let socket = MessageSocket::new(transport.clone());
    let cancel = CancellationToken::new();

    let result = socket
        .close(CloseStatus::InternalServerError, "oops", &cancel)
        .await;
    assert!(matches!(result, Err(Error::Transport { .. })));
    assert_eq!(socket.state(), SocketState::Open);

    socket.send_text(b"still open", true, &cancel).await?;
    assert_eq!(transport.sent_payloads(), vec![b"still open".to_vec()]);
    Ok(())
}

/// Application code written against the trait, not the concrete socket.
async fn greet(socket: &dyn WebSocket, cancel: &CancellationToken) -> ordered_websocket::Result<()> {
    socket.send_text(b"hello", false, cancel).await?;
    socket.send_text(b" world", true, cancel).await
}

#[tokio::test]
async fn test_trait_object_sends() -> Result<()> {
    let transport = MockTransport::new().into_arc();
    let socket = MessageSocket::new(transport.clone());

    greet(&socket, &CancellationToken::new()).await?;

    assert_eq!(
        transport.sent_payloads(),
        vec![b"hello".to_vec(), b" world".to_vec()]
    );
    assert!(socket.close_status().is_none());
    Ok(())
}
