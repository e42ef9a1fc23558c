//! Integration tests for the autodiscover cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use autodiscover_cache::{AuthType, DiscoveryRecord, PersistentStore, RetryPolicy, StorageIdentity};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn adcache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("adcache");
        cmd.env("ADCACHE_DIR", temp.path())
            .env("ADCACHE_CONFIG", temp.path().join("config.toml"));
        cmd
    }

    fn store(temp: &TempDir) -> PersistentStore {
        PersistentStore::new(StorageIdentity::current().path_in(temp.path()))
    }

    fn seed(temp: &TempDir, domain: &str) {
        let record = DiscoveryRecord::new(
            format!("https://mail.{domain}/EWS/Exchange.asmx"),
            AuthType::Ntlm,
            RetryPolicy::FailFast,
        );
        store(temp).set(domain, &record).unwrap();
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        adcache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Two-tier process-shared cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        adcache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("adcache"));
    }

    #[test]
    fn path_points_into_cache_dir() {
        let temp = TempDir::new().unwrap();
        let expected = StorageIdentity::current().file_name();
        adcache(&temp)
            .arg("path")
            .assert()
            .success()
            .stdout(predicate::str::contains(expected));
    }

    #[test]
    fn list_empty() {
        let temp = TempDir::new().unwrap();
        adcache(&temp)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn list_shows_seeded_domains() {
        let temp = TempDir::new().unwrap();
        seed(&temp, "example.com");
        seed(&temp, "example.org");

        adcache(&temp)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::eq("example.com\nexample.org\n"));
    }

    #[test]
    fn show_missing_domain_fails() {
        let temp = TempDir::new().unwrap();
        adcache(&temp)
            .args(["show", "nowhere.org"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Domain not cached: nowhere.org"));
    }

    #[test]
    fn show_prints_record() {
        let temp = TempDir::new().unwrap();
        seed(&temp, "example.com");

        adcache(&temp)
            .args(["show", "example.com", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"auth_type\": \"NTLM\""))
            .stdout(predicate::str::contains("https://mail.example.com/EWS/Exchange.asmx"));
    }

    #[test]
    fn remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        seed(&temp, "example.com");

        adcache(&temp)
            .args(["remove", "example.com"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed"));
        adcache(&temp)
            .args(["remove", "example.com"])
            .assert()
            .success()
            .stdout(predicate::str::contains("was not cached"));

        assert!(!store(&temp).contains("example.com").unwrap());
    }

    #[test]
    fn clear_requires_confirmation() {
        let temp = TempDir::new().unwrap();
        seed(&temp, "example.com");

        // Non-interactive without --yes declines
        adcache(&temp).arg("clear").assert().success();
        assert!(store(&temp).contains("example.com").unwrap());

        adcache(&temp)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 1 domain(s)"));
        assert!(store(&temp).is_empty().unwrap());
    }

    #[test]
    fn corrupt_store_is_recovered() {
        let temp = TempDir::new().unwrap();
        std::fs::write(store(&temp).path(), vec![0x5A; 2048]).unwrap();

        adcache(&temp)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"))
            .stderr(predicate::str::contains("Deleting invalid cache file"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        adcache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        adcache(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").exists());
    }
}

mod cache_tests {
    use autodiscover_cache::error::{CacheError, CacheResult};
    use autodiscover_cache::{
        AuthType, AutodiscoverCache, CacheKey, Connection, ConnectionFactory, DiscoveryRecord,
        PersistentStore, RetryPolicy, StorageIdentity,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct EwsConnection {
        record: DiscoveryRecord,
        closed: AtomicUsize,
    }

    impl Connection for EwsConnection {
        fn service_endpoint(&self) -> &str {
            &self.record.service_endpoint
        }

        fn auth_type(&self) -> AuthType {
            self.record.auth_type
        }

        fn retry_policy(&self) -> &RetryPolicy {
            &self.record.retry_policy
        }

        fn close(&self) -> CacheResult<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct EwsFactory {
        built: AtomicUsize,
    }

    impl ConnectionFactory for EwsFactory {
        type Credentials = (String, String);
        type Connection = EwsConnection;

        fn connect(
            &self,
            record: DiscoveryRecord,
            _credentials: &(String, String),
        ) -> CacheResult<EwsConnection> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(EwsConnection {
                record,
                closed: AtomicUsize::new(0),
            })
        }
    }

    fn cache_at(temp: &TempDir) -> AutodiscoverCache<EwsFactory> {
        let store = PersistentStore::new(StorageIdentity::for_user("it").path_in(temp.path()));
        AutodiscoverCache::new(EwsFactory::default(), store)
    }

    fn creds() -> (String, String) {
        ("alice@example.com".to_string(), "pa55word".to_string())
    }

    fn connection(endpoint: &str) -> Arc<EwsConnection> {
        Arc::new(EwsConnection {
            record: DiscoveryRecord::new(
                endpoint,
                AuthType::OAuth2,
                RetryPolicy::FaultTolerant { max_wait_secs: 120 },
            ),
            closed: AtomicUsize::new(0),
        })
    }

    #[test]
    fn two_instances_share_the_store() {
        let temp = TempDir::new().unwrap();
        let writer = cache_at(&temp);
        let reader = cache_at(&temp);
        let key = CacheKey::new("example.com", creds());

        assert!(!reader.contains("example.com").unwrap());
        writer
            .insert(key.clone(), connection("https://outlook.example.com/EWS/Exchange.asmx"))
            .unwrap();

        assert!(reader.contains("example.com").unwrap());
        let found = reader.lookup(&key).unwrap();
        assert_eq!(found.service_endpoint(), "https://outlook.example.com/EWS/Exchange.asmx");
        assert_eq!(found.auth_type(), AuthType::OAuth2);
        assert_eq!(reader.factory().built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_by_one_instance_is_seen_by_the_other() {
        let temp = TempDir::new().unwrap();
        let a = cache_at(&temp);
        let b = cache_at(&temp);
        let key = CacheKey::new("example.com", creds());

        a.insert(key.clone(), connection("https://a.example.com")).unwrap();
        b.remove(&key).unwrap();

        assert!(!a.contains("example.com").unwrap());
        // a still holds its live handle; membership is decided by the store
        assert_eq!(a.cached_connections(), 1);
    }

    #[test]
    fn corrupt_file_behaves_as_empty() {
        let temp = TempDir::new().unwrap();
        let cache = cache_at(&temp);
        std::fs::write(cache.store().path(), b"\x00\x01garbage garbage garbage").unwrap();

        let err = cache.lookup(&CacheKey::new("example.com", creds())).unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));

        cache
            .insert(CacheKey::new("example.com", creds()), connection("https://example.com"))
            .unwrap();
        assert!(cache.contains("example.com").unwrap());
    }

    #[test]
    fn concurrent_lookups_share_one_handle() {
        let temp = TempDir::new().unwrap();
        let cache = cache_at(&temp);
        cache
            .store()
            .set(
                "example.com",
                &DiscoveryRecord::new("https://example.com", AuthType::Basic, RetryPolicy::FailFast),
            )
            .unwrap();
        let key = CacheKey::new("example.com", creds());

        let handles: Vec<Arc<EwsConnection>> = thread::scope(|s| {
            let workers: Vec<_> = (0..8).map(|_| s.spawn(|| cache.lookup(&key).unwrap())).collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let first = &handles[0];
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, first)));
        assert_eq!(cache.cached_connections(), 1);
    }

    #[test]
    fn shared_instance_discovers_once_across_threads() {
        let temp = TempDir::new().unwrap();
        let cache = Arc::new(cache_at(&temp));
        let discoveries = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("example.com", creds());

        let workers: Vec<_> = (0..6)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let discoveries = Arc::clone(&discoveries);
                let key = key.clone();
                thread::spawn(move || {
                    cache
                        .get_or_insert_with(&key, |domain, _| {
                            discoveries.fetch_add(1, Ordering::SeqCst);
                            Ok(connection(&format!("https://mail.{domain}")))
                        })
                        .unwrap()
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(discoveries.load(Ordering::SeqCst), 1);
        assert!(cache.contains("example.com").unwrap());
    }

    #[test]
    fn close_then_lookup_rebuilds() {
        let temp = TempDir::new().unwrap();
        let cache = cache_at(&temp);
        let key = CacheKey::new("example.com", creds());
        let original = connection("https://example.com");
        cache.insert(key.clone(), Arc::clone(&original)).unwrap();

        cache.close().unwrap();

        assert_eq!(original.closed.load(Ordering::SeqCst), 1);
        let rebuilt = cache.lookup(&key).unwrap();
        assert!(!Arc::ptr_eq(&original, &rebuilt));
        assert_eq!(rebuilt.closed.load(Ordering::SeqCst), 0);
    }
}
