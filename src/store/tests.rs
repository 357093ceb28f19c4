#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::config::StoreConfig;
    use crate::models::Address;
    use crate::store::{open_store, AddressStore, InMemoryStore, JsonFileStore, SqliteStore, StoreError};

    fn address(n: u8) -> Address {
        Address::parse(&format!("0x{}", format!("{:02x}", n).repeat(20))).expect("valid test address")
    }

    #[test]
    fn test_json_missing_file_is_empty_set() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("wallets.json"));

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_json_save_then_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("wallets.json"));

        store.save(&[address(0x22), address(0x11)]).unwrap();
        assert_eq!(store.load().unwrap(), vec![address(0x22), address(0x11)]);

        // No temp file left behind
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_json_concurrent_saves_all_succeed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallets.json");
        let sets: Vec<Vec<Address>> = (0..4u8)
            .map(|writer| (0..=writer).map(|n| address(0x10 + n)).collect())
            .collect();

        let handles: Vec<_> = sets
            .iter()
            .cloned()
            .map(|set| {
                let store = JsonFileStore::new(&path);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| store.save(&set))
                        .filter(|result| result.is_err())
                        .count()
                })
            })
            .collect();

        let failures: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();
        assert_eq!(failures, 0);

        // The file holds exactly one writer's complete set
        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert!(sets.contains(&loaded));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != "wallets.json")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_json_file_is_plain_array_of_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallets.json");
        let store = JsonFileStore::new(&path);

        store.save(&[address(0xab)]).unwrap();
        let on_disk: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec!["0xabababababababababababababababababababab".to_string()]);
    }

    #[test]
    fn test_json_load_normalizes_and_deduplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallets.json");
        fs::write(
            &path,
            r#"["0xABABABABABABABABABABABABABABABABABABABAB", "0xabababababababababababababababababababab"]"#,
        )
        .unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(loaded, vec![address(0xab)]);
    }

    #[test]
    fn test_json_malformed_content_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallets.json");

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonFileStore::new(&path).load(), Err(StoreError::Malformed { .. })));

        fs::write(&path, r#"["0x1234"]"#).unwrap();
        assert!(matches!(JsonFileStore::new(&path).load(), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn test_sqlite_save_replaces_whole_set() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());

        store.save(&[address(0x01), address(0x02), address(0x03)]).unwrap();
        assert_eq!(store.load().unwrap().len(), 3);

        store.save(&[address(0x03), address(0x01)]).unwrap();
        assert_eq!(store.load().unwrap(), vec![address(0x03), address(0x01)]);
    }

    #[test]
    fn test_sqlite_file_persists_between_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallets.db");
        let path = path.to_str().unwrap();

        SqliteStore::new(path).unwrap().save(&[address(0x42)]).unwrap();
        assert_eq!(SqliteStore::new(path).unwrap().load().unwrap(), vec![address(0x42)]);
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryStore::with_addresses(vec![address(0x01)]);
        assert_eq!(store.load().unwrap(), vec![address(0x01)]);

        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.describe(), "memory");
    }

    #[test]
    fn test_open_store_selects_backend() {
        let dir = TempDir::new().unwrap();

        let json: Arc<dyn AddressStore> = open_store(&StoreConfig {
            backend: "json".to_string(),
            path: dir.path().join("w.json").to_string_lossy().into_owned(),
        })
        .unwrap();
        assert!(json.describe().starts_with("json:"));

        let sqlite = open_store(&StoreConfig {
            backend: "sqlite".to_string(),
            path: dir.path().join("w.db").to_string_lossy().into_owned(),
        })
        .unwrap();
        assert!(sqlite.describe().starts_with("sqlite:"));

        let unknown = open_store(&StoreConfig {
            backend: "redis".to_string(),
            path: "x".to_string(),
        });
        assert!(matches!(unknown, Err(StoreError::UnknownBackend(_))));
    }
}
