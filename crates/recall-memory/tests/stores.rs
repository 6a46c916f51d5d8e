//! End-to-end flow across both stores: ingest a conversation, chunk and
//! embed it, search, then clean up.

use recall_memory::{
    Conversation, ConversationStore, Document, DocumentFilter, DocumentMetadata, Message,
    VectorStore,
};

fn fake_embedding(seed: f32) -> Vec<f32> {
    vec![seed, 1.0 - seed, 0.5]
}

#[tokio::test]
async fn index_pipeline_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let conversations = ConversationStore::open(&dir.path().join("data")).await.unwrap();
    let vectors = VectorStore::open(&dir.path().join("vectors"), 3).await.unwrap();

    // Ingest.
    let mut conv = Conversation::new("claude_code");
    conv.project_path = Some("/home/dev/api".into());
    conv.messages.push(Message::new("user", "how do I paginate?"));
    conv.messages
        .push(Message::new("assistant", "use limit and offset"));
    conversations.save(&conv).await.unwrap();

    // The conversation is queued for indexing.
    let queue = conversations.list_unindexed(10).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, conv.id);

    // Chunk each message into a document and store embeddings.
    let mut docs = Vec::new();
    let mut embeddings = Vec::new();
    for (i, message) in conv.messages.iter().enumerate() {
        let mut meta = DocumentMetadata::new("claude_code");
        meta.conversation_id = Some(conv.id.clone());
        meta.project_path = conv.project_path.clone();
        meta.chunk_index = i64::try_from(i).unwrap();
        docs.push(Document::new(message.content.clone(), meta));
        #[allow(clippy::cast_precision_loss)]
        embeddings.push(fake_embedding(0.1 * i as f32));
    }
    vectors.add_batch(&docs, &embeddings).await.unwrap();
    assert_eq!(vectors.count().await.unwrap(), 2);

    conversations.mark_indexed(&conv.id, None).await.unwrap();
    assert!(conversations.list_unindexed(10).await.unwrap().is_empty());

    // Search scoped to the conversation finds the nearest chunk first.
    let filter = DocumentFilter::conversation_id(&conv.id);
    let results = vectors
        .search(&fake_embedding(0.1), 10, Some(&filter))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].document.text, "use limit and offset");
    assert!(results[0].score >= results[1].score);

    // Cleanup removes the conversation and its derived documents.
    let removed = vectors.delete_by_conversation(&conv.id).await.unwrap();
    assert_eq!(removed, 2);
    assert!(conversations.delete(&conv.id).await.unwrap());
    assert_eq!(vectors.count().await.unwrap(), 0);
    assert_eq!(conversations.get_stats().await.unwrap().total, 0);

    conversations.close().await;
    vectors.close().await;
}
