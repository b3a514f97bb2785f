use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex},
};

use crate::{error, gateway, model};

#[derive(Default)]
struct MockState {
    objects: BTreeMap<String, Vec<u8>>,
    puts: Vec<model::UploadPayload>,
    fail_keys: HashSet<String>,
    fail_get_keys: HashSet<String>,
}

/// In-memory gateway for tests and downstream consumers.
///
/// Keys are held in lexicographic order so marker pagination behaves like
/// the real listing contract. Clones share state, so a test can keep a
/// handle while the store owns the boxed copy.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, body: &[u8]) {
        let mut state = self.state.lock().expect("failed to acquire mock guard");
        state.objects.insert(key.to_string(), body.to_vec());
    }

    /// Makes every put of `key` fail with a transport error.
    pub fn fail_put(&self, key: &str) {
        let mut state = self.state.lock().expect("failed to acquire mock guard");
        state.fail_keys.insert(key.to_string());
    }

    /// Makes the next get of `key` fail with a transport error, then
    /// behave normally again.
    pub fn fail_get_once(&self, key: &str) {
        let mut state = self.state.lock().expect("failed to acquire mock guard");
        state.fail_get_keys.insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        let state = self.state.lock().expect("failed to acquire mock guard");
        state.objects.keys().cloned().collect()
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().expect("failed to acquire mock guard");
        state.objects.get(key).cloned()
    }

    /// Payloads received by `put`, in call order, successful or not.
    pub fn recorded_puts(&self) -> Vec<model::UploadPayload> {
        let state = self.state.lock().expect("failed to acquire mock guard");
        state.puts.clone()
    }
}

impl gateway::StorageGateway for MockGateway {
    fn put(&self, _bucket: &str, payload: &model::UploadPayload) -> Result<(), error::StoreError> {
        let mut state = self.state.lock().expect("failed to acquire mock guard");
        state.puts.push(payload.clone());

        if state.fail_keys.contains(&payload.key) {
            return Err(error::StoreError::Transport(format!(
                "injected put failure: {}",
                payload.key
            )));
        }

        state
            .objects
            .insert(payload.key.clone(), payload.body.clone());

        Ok(())
    }

    fn get(&self, _bucket: &str, key: &str) -> Result<Option<Vec<u8>>, error::StoreError> {
        let mut state = self.state.lock().expect("failed to acquire mock guard");

        if state.fail_get_keys.remove(key) {
            return Err(error::StoreError::Transport(format!(
                "injected get failure: {}",
                key
            )));
        }

        Ok(state.objects.get(key).cloned())
    }

    fn delete(&self, _bucket: &str, key: &str) -> Result<(), error::StoreError> {
        let mut state = self.state.lock().expect("failed to acquire mock guard");
        state.objects.remove(key);

        Ok(())
    }

    fn copy(&self, _bucket: &str, src_key: &str, dst_key: &str) -> Result<(), error::StoreError> {
        let mut state = self.state.lock().expect("failed to acquire mock guard");

        let body = match state.objects.get(src_key) {
            Some(body) => body.clone(),
            None => {
                return Err(error::StoreError::Transport(format!(
                    "copy source missing: {}",
                    src_key
                )));
            }
        };

        state.objects.insert(dst_key.to_string(), body);

        Ok(())
    }

    fn exists(&self, _bucket: &str, key: &str) -> Result<bool, error::StoreError> {
        let state = self.state.lock().expect("failed to acquire mock guard");

        Ok(state.objects.contains_key(key))
    }

    fn list(
        &self,
        _bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> Result<model::Listing, error::StoreError> {
        let state = self.state.lock().expect("failed to acquire mock guard");

        let prefix = prefix.unwrap_or("");
        let mut listing = model::Listing::default();

        for key in state.objects.keys() {
            if !key.starts_with(prefix) {
                continue;
            }

            if let Some(marker) = marker {
                if key.as_str() <= marker {
                    continue;
                }
            }

            if let Some(delim) = delimiter {
                let rest = &key[prefix.len()..];
                if let Some(pos) = rest.find(delim) {
                    let common = format!("{}{}", prefix, &rest[..pos + delim.len()]);
                    if !listing.common_prefixes.contains(&common) {
                        listing.common_prefixes.push(common);
                    }
                    continue;
                }
            }

            if listing.entries.len() < max_keys as usize {
                listing.entries.push(key.clone());
            }
        }

        Ok(listing)
    }

    fn delete_all_under_prefix(&self, _bucket: &str, prefix: &str) -> Result<(), error::StoreError> {
        let mut state = self.state.lock().expect("failed to acquire mock guard");
        state.objects.retain(|key, _| !key.starts_with(prefix));

        Ok(())
    }
}
