//! # Workflow Integration Tests
//!
//! The publish / list / read choreography exercised end to end through
//! [`NewsroomApi`], with the mock wallet, ledger, and gateway standing in
//! for the real collaborators. Covers the ordering and failure-isolation
//! guarantees the views rely on:
//!
//! 1. **Publish sequencing**: content is stored before any ledger write.
//! 2. **Partial listing**: one unreadable record never empties a listing.
//! 3. **Access filtering**: restricted articles stay out of public views.
//! 4. **Body caching**: one retrieval per content hash per session.
//! 5. **Role purity**: roles derive from ledger state and identity alone.

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use denews_client::{
        AccessLevel, Address, ArticleDraft, ArticleSyncService, CallLog, ClientConfig, ClientError,
        MockGateway, MockLedger, MockWallet, NewsroomApi, PublishError, Role, WalletSession,
        WorkflowEvent,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn addr(suffix: &str) -> Address {
        format!("0x{:0>40}", suffix).parse().unwrap()
    }

    fn admin() -> Address {
        addr("ad")
    }

    fn author() -> Address {
        addr("a1")
    }

    /// A service over the given mocks, with the fixture admin configured.
    /// The mocks stay accessible through the returned `Arc` handles.
    fn service_over(
        ledger: Arc<MockLedger>,
        gateway: Arc<MockGateway>,
    ) -> ArticleSyncService<MockLedger, MockGateway> {
        let mut config = ClientConfig::for_testing();
        config.admin_address = admin();
        ArticleSyncService::new(config, ledger, gateway)
    }

    fn draft(title: &str, content: &str) -> ArticleDraft {
        ArticleDraft {
            title: title.to_string(),
            content: content.to_string(),
            access: AccessLevel::Public,
        }
    }

    // =========================================================================
    // PUBLISH: STORE-THEN-RECORD SEQUENCING
    // =========================================================================

    /// The content object must exist before its hash is written anywhere;
    /// a shared call log across both mocks proves the order.
    #[tokio::test]
    async fn test_publish_stores_content_before_recording_metadata() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let ledger = Arc::new(MockLedger::new(admin(), author()).with_call_log(log.clone()));
        ledger.authorize(author());
        let gateway = Arc::new(MockGateway::default().with_call_log(log.clone()));
        let service = service_over(ledger, gateway);

        let receipt = service.publish(&draft("First", "hello world")).await.unwrap();

        assert_eq!(receipt.article_id, 0);
        assert_eq!(receipt.content_hash, MockGateway::address_of("hello world"));
        assert_eq!(
            *log.lock(),
            vec!["upload", "submit_publish", "wait_confirmed"]
        );

        let recorded = service.article(0).await.unwrap();
        assert_eq!(recorded.content_hash, receipt.content_hash);
        assert_eq!(recorded.author, author());
    }

    /// Progress events arrive in workflow order, with the ledger write
    /// reported as two distinct phases.
    #[tokio::test]
    async fn test_publish_emits_two_phase_progress() {
        let ledger = Arc::new(MockLedger::new(admin(), author()));
        ledger.authorize(author());
        let service = service_over(ledger, Arc::new(MockGateway::default()));
        let mut events = service.subscribe_events();

        service.publish(&draft("First", "hello world")).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), WorkflowEvent::UploadStarted);
        assert_eq!(
            events.recv().await.unwrap(),
            WorkflowEvent::ContentUploaded {
                content_hash: MockGateway::address_of("hello world"),
            }
        );
        assert!(matches!(
            events.recv().await.unwrap(),
            WorkflowEvent::TxSubmitted { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            WorkflowEvent::TxConfirmed {
                article_id: Some(0),
                ..
            }
        ));
    }

    /// A store outage fails the publish before any ledger call is made.
    #[tokio::test]
    async fn test_store_outage_fails_before_any_ledger_write() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let ledger = Arc::new(MockLedger::new(admin(), author()).with_call_log(log.clone()));
        ledger.authorize(author());
        let gateway = Arc::new(MockGateway::default().with_call_log(log.clone()));
        gateway.fail_upload.store(true, Ordering::Relaxed);
        let service = service_over(ledger, gateway);

        let err = service.publish(&draft("First", "hello world")).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::BeforeUpload {
                source: ClientError::StoreUnreachable(_),
            }
        ));
        assert!(!log.lock().iter().any(|c| c == "submit_publish"));
    }

    /// An unauthorized publish leaves an orphaned content object; the error
    /// carries the hash, and resubmitting with it skips the upload step.
    #[tokio::test]
    async fn test_rejected_publish_reports_hash_for_resubmission() {
        let ledger = Arc::new(MockLedger::new(admin(), author()));
        let gateway = Arc::new(MockGateway::default());
        let service = service_over(ledger.clone(), gateway.clone());

        let err = service.publish(&draft("First", "hello world")).await.unwrap_err();

        let expected = MockGateway::address_of("hello world");
        assert_eq!(err.uploaded_hash(), Some(&expected));
        assert_eq!(
            *err.source_error(),
            ClientError::TransactionReverted("caller not authorized".to_string())
        );
        assert!(err.to_string().contains(expected.as_str()));

        // Authorization granted out of band; the stored content is reused.
        let uploads_so_far = gateway.upload_calls.load(Ordering::Relaxed);
        ledger.authorize(author());
        let receipt = service
            .resubmit("First", &expected, AccessLevel::Public)
            .await
            .unwrap();
        assert_eq!(receipt.content_hash, expected);
        assert_eq!(
            gateway.upload_calls.load(Ordering::Relaxed),
            uploads_so_far,
            "resubmit must not upload again"
        );
    }

    // =========================================================================
    // LISTING: PARTIAL FAILURE AND ACCESS FILTERING
    // =========================================================================

    /// One unreadable record is skipped; the other four come back in
    /// ascending id order with no global failure.
    #[tokio::test]
    async fn test_listing_survives_partially_unreadable_ledger() {
        let ledger = Arc::new(MockLedger::new(admin(), author()));
        for i in 0..5 {
            ledger.seed_article(&format!("article {i}"), author(), AccessLevel::Public);
        }
        ledger.fail_id(3);
        let service = service_over(ledger, Arc::new(MockGateway::default()));

        let ids: Vec<u64> = service
            .list_public()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 4]);
    }

    /// Restricted articles never appear in the public listing, but an
    /// author's own listing keeps them.
    #[tokio::test]
    async fn test_public_listing_excludes_restricted_articles() {
        let ledger = Arc::new(MockLedger::new(admin(), author()));
        ledger.seed_article("open", author(), AccessLevel::Public);
        ledger.seed_article("drafting", author(), AccessLevel::Restricted);
        ledger.seed_article("someone else", addr("b2"), AccessLevel::Public);
        let service = service_over(ledger, Arc::new(MockGateway::default()));

        let public: Vec<u64> = service
            .list_public()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(public, vec![0, 2]);

        let own: Vec<u64> = service
            .list_by_author(&author())
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(own, vec![0, 1]);
    }

    // =========================================================================
    // READING: SESSION-LIFETIME BODY CACHE
    // =========================================================================

    /// Repeated reads of the same article hit the gateway exactly once.
    #[tokio::test]
    async fn test_read_body_fetches_once_per_session() {
        let gateway = Arc::new(MockGateway::default());
        let hash = gateway.seed("the full body text");
        let service = service_over(Arc::new(MockLedger::new(admin(), author())), gateway.clone());

        for _ in 0..3 {
            assert_eq!(service.read_body(&hash).await.unwrap(), "the full body text");
        }
        assert_eq!(gateway.retrieve_calls.load(Ordering::Relaxed), 1);
    }

    /// Two concurrent reads of the same uncached hash share one in-flight
    /// retrieval; both observe the same body.
    #[tokio::test]
    async fn test_concurrent_reads_share_one_retrieval() {
        let gateway = Arc::new(MockGateway::default());
        let hash = gateway.seed("the full body text");
        *gateway.retrieve_delay.lock() = Some(Duration::from_millis(50));
        let service = Arc::new(service_over(
            Arc::new(MockLedger::new(admin(), author())),
            gateway.clone(),
        ));

        let first = tokio::spawn({
            let service = service.clone();
            let hash = hash.clone();
            async move { service.read_body(&hash).await }
        });
        let second = tokio::spawn({
            let service = service.clone();
            let hash = hash.clone();
            async move { service.read_body(&hash).await }
        });

        assert_eq!(first.await.unwrap().unwrap(), "the full body text");
        assert_eq!(second.await.unwrap().unwrap(), "the full body text");
        assert_eq!(gateway.retrieve_calls.load(Ordering::Relaxed), 1);
    }

    /// A failed retrieval is not cached; the next read tries again and can
    /// succeed once the gateway recovers.
    #[tokio::test]
    async fn test_failed_read_is_retried_not_cached() {
        let gateway = Arc::new(MockGateway::default());
        let hash = gateway.seed("recovered body");
        gateway.fail_retrieve.store(true, Ordering::Relaxed);
        let service = service_over(Arc::new(MockLedger::new(admin(), author())), gateway.clone());

        assert!(service.read_body(&hash).await.is_err());

        gateway.fail_retrieve.store(false, Ordering::Relaxed);
        assert_eq!(service.read_body(&hash).await.unwrap(), "recovered body");
        assert_eq!(gateway.retrieve_calls.load(Ordering::Relaxed), 2);
    }

    // =========================================================================
    // ROLES: PURE DERIVATION FROM LEDGER STATE
    // =========================================================================

    /// With identical ledger state, the role depends only on the identity:
    /// the configured admin sees Admin, an authorized author sees Author,
    /// everyone else sees Reader.
    #[tokio::test]
    async fn test_roles_derive_from_identity_and_ledger_state_alone() {
        let ledger = Arc::new(MockLedger::new(admin(), author()));
        ledger.authorize(author());
        let service = service_over(ledger.clone(), Arc::new(MockGateway::default()));

        assert_eq!(service.role_for_identity(&admin()).await.unwrap(), Role::Admin);
        assert_eq!(service.role_for_identity(&author()).await.unwrap(), Role::Author);
        assert_eq!(service.role_for_identity(&addr("b2")).await.unwrap(), Role::Reader);

        // Admin standing takes precedence over authors-set membership.
        ledger.authorize(admin());
        assert_eq!(service.role_for_identity(&admin()).await.unwrap(), Role::Admin);
    }

    /// Granting authorship through the ledger write path changes the
    /// derived role, and the ledger enforces the admin gate itself.
    #[tokio::test]
    async fn test_add_author_flow_updates_derived_role() {
        let ledger = Arc::new(MockLedger::new(admin(), author()));
        let service = service_over(ledger.clone(), Arc::new(MockGateway::default()));

        // Non-admin caller: the write reverts on the ledger side.
        assert!(matches!(
            service.add_author(&addr("b2")).await,
            Err(ClientError::TransactionReverted(_))
        ));
        assert_eq!(service.role_for_identity(&addr("b2")).await.unwrap(), Role::Reader);

        ledger.set_caller(admin());
        let receipt = service.add_author(&addr("b2")).await.unwrap();
        assert_eq!(receipt.article_id, None);
        assert_eq!(service.role_for_identity(&addr("b2")).await.unwrap(), Role::Author);
    }

    // =========================================================================
    // END TO END: CONNECT, PUBLISH, LIST, READ
    // =========================================================================

    /// The whole happy path through the public surface: connect a wallet
    /// session, publish as the connected identity, see the article in the
    /// public listing, and read its body back.
    #[tokio::test]
    async fn test_connect_publish_list_read_choreography() {
        let wallet = Arc::new(MockWallet::with_account(author()));
        let session = WalletSession::new(wallet);
        let identity = session.connect().await.unwrap();
        assert_eq!(identity, author());

        let ledger = Arc::new(MockLedger::new(admin(), identity.clone()));
        ledger.authorize(identity.clone());
        let service = service_over(ledger, Arc::new(MockGateway::default()));

        let receipt = service
            .publish(&draft("Launch Day", "we are live"))
            .await
            .unwrap();

        let listed = service.list_public().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, receipt.article_id);
        assert_eq!(listed[0].author, identity);

        let body = service.read_body(&listed[0].content_hash).await.unwrap();
        assert_eq!(body, "we are live");

        session.teardown();
    }
}
