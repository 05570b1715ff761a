//! Orchestration of capture, upload, and the recording collection.
//!
//! The pipeline owns the client-side store, the per-filename audio cache,
//! and the two user-facing error channels. Failures are classified at this
//! boundary: microphone and analysis problems report on the capture channel,
//! listing/server problems on the connection channel. The two are displayed
//! and cleared independently. No call is ever retried automatically.

use std::collections::{HashMap, HashSet};

use crate::api::{ApiError, GradingApi};
use crate::capture::{AudioClip, CaptureError};
use crate::grading::{self, StructuredResult};
use crate::recordings::RecordingStore;

/// Fetched audio bytes keyed by server filename.
///
/// Entries are created lazily on first playback and released when their
/// owning recording leaves the store, so the cache never outlives the
/// recordings it serves.
#[derive(Debug, Default)]
pub struct AudioCache {
    entries: HashMap<String, Vec<u8>>,
}

impl AudioCache {
    pub fn get(&self, filename: &str) -> Option<&[u8]> {
        self.entries.get(filename).map(Vec::as_slice)
    }

    pub fn insert(&mut self, filename: String, bytes: Vec<u8>) {
        self.entries.insert(filename, bytes);
    }

    pub fn release(&mut self, filename: &str) {
        if self.entries.remove(filename).is_some() {
            tracing::debug!("Released cached audio for {filename}");
        }
    }

    /// Drops every entry whose filename the predicate rejects.
    pub fn retain_only(&mut self, keep: impl Fn(&str) -> bool) {
        self.entries.retain(|filename, _| keep(filename));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Drives the record → analyze → refresh → browse flow against one backend.
pub struct PracticePipeline<A: GradingApi> {
    api: A,
    store: RecordingStore,
    audio: AudioCache,
    deletes_in_flight: HashSet<i64>,
    capture_error: Option<String>,
    connection_error: Option<String>,
}

impl<A: GradingApi> PracticePipeline<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            store: RecordingStore::new(),
            audio: AudioCache::default(),
            deletes_in_flight: HashSet::new(),
            capture_error: None,
            connection_error: None,
        }
    }

    pub fn store(&self) -> &RecordingStore {
        &self.store
    }

    /// Last capture/analysis failure, shown and cleared on its own.
    pub fn capture_error(&self) -> Option<&str> {
        self.capture_error.as_deref()
    }

    /// Last connection/server failure, shown and cleared on its own.
    pub fn connection_error(&self) -> Option<&str> {
        self.connection_error.as_deref()
    }

    /// Routes a microphone failure onto the capture channel.
    pub fn record_capture_failure(&mut self, err: &CaptureError) {
        tracing::error!("Capture failed: {err}");
        self.capture_error = Some(err.to_string());
    }

    /// Refreshes the store from the server listing.
    ///
    /// On failure the stale collection is kept and the connection channel is
    /// set. On success cached audio for recordings that no longer exist is
    /// released.
    pub async fn refresh(&mut self) -> bool {
        match self.api.list_recordings().await {
            Ok(recordings) => {
                self.store.replace_all(recordings);
                let live: HashSet<String> =
                    self.store.iter().map(|r| r.filename.clone()).collect();
                self.audio.retain_only(|filename| live.contains(filename));
                tracing::debug!(
                    "Refreshed {} recordings, {} cached audio entries kept",
                    self.store.len(),
                    self.audio.len()
                );
                self.connection_error = None;
                true
            }
            Err(err) => {
                tracing::error!("Failed to refresh recordings: {err}");
                self.connection_error = Some(err.to_string());
                false
            }
        }
    }

    /// Submits a finished clip for grading, then refreshes the listing.
    ///
    /// The analyze call strictly precedes the refresh; an analyze failure
    /// leaves the store untouched, triggers no refresh, and reports on the
    /// capture channel. A refresh failure after a successful analyze reports
    /// on the connection channel while the grading result is still returned.
    pub async fn submit_recording(
        &mut self,
        clip: &AudioClip,
        prompt: &str,
    ) -> Result<Option<StructuredResult>, ApiError> {
        let payload = match self.api.analyze(clip, prompt).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!("Analysis failed: {err}");
                self.capture_error = Some(err.to_string());
                return Err(err);
            }
        };
        self.capture_error = None;

        let result = grading::parse_model_response(Some(&payload));
        match &result {
            None => tracing::warn!("Analysis succeeded but returned an unstructured payload"),
            Some(r) if r.status.as_deref() == Some("error") => {
                tracing::warn!("Grading service reported an error status for this recording")
            }
            Some(_) => {}
        }

        self.refresh().await;
        Ok(result)
    }

    /// Deletes a recording after server confirmation.
    ///
    /// The store entry is removed, and its cached audio released, only once
    /// the server reports success; on failure both are left unchanged and
    /// the connection channel is set. A delete for an id already in flight
    /// is ignored. Returns true when an entry was removed.
    pub async fn delete_recording(&mut self, id: i64) -> Result<bool, ApiError> {
        if !self.deletes_in_flight.insert(id) {
            tracing::debug!("Delete for recording {id} already in flight; ignored");
            return Ok(false);
        }

        let outcome = self.api.delete_recording(id).await;
        self.deletes_in_flight.remove(&id);

        match outcome {
            Ok(()) => {
                if let Some(removed) = self.store.remove(id) {
                    self.audio.release(&removed.filename);
                }
                self.connection_error = None;
                tracing::info!("Deleted recording {id}");
                Ok(true)
            }
            Err(err) => {
                tracing::error!("Failed to delete recording {id}: {err}");
                self.connection_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Returns the audio bytes for a recording, fetching on first use.
    ///
    /// Fetches are memoized per filename; repeated playback of the same
    /// recording reuses the cached bytes.
    pub async fn audio(&mut self, filename: &str) -> Result<&[u8], ApiError> {
        if self.audio.get(filename).is_none() {
            match self.api.fetch_audio(filename).await {
                Ok(bytes) => {
                    tracing::debug!("Fetched {} bytes of audio for {filename}", bytes.len());
                    self.audio.insert(filename.to_string(), bytes);
                }
                Err(err) => {
                    tracing::error!("Failed to fetch audio for {filename}: {err}");
                    self.connection_error = Some(err.to_string());
                    return Err(err);
                }
            }
        }
        Ok(self.audio.get(filename).expect("just inserted"))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::capture::encode_wav;
    use crate::recordings::Recording;

    /// Scriptable in-memory backend.
    #[derive(Default)]
    struct StubApi {
        listing: Vec<Recording>,
        fail_analyze: bool,
        fail_list: bool,
        fail_delete: bool,
        analyze_payload: String,
        list_calls: Cell<u32>,
        fetch_calls: Cell<u32>,
        deleted: RefCell<Vec<i64>>,
    }

    impl GradingApi for StubApi {
        async fn list_recordings(&self) -> Result<Vec<Recording>, ApiError> {
            self.list_calls.set(self.list_calls.get() + 1);
            if self.fail_list {
                return Err(ApiError::Connect);
            }
            Ok(self.listing.clone())
        }

        async fn analyze(&self, _clip: &AudioClip, _prompt: &str) -> Result<String, ApiError> {
            if self.fail_analyze {
                return Err(ApiError::Server {
                    status: 500,
                    body: "model crashed".into(),
                });
            }
            Ok(self.analyze_payload.clone())
        }

        async fn fetch_audio(&self, _filename: &str) -> Result<Vec<u8>, ApiError> {
            self.fetch_calls.set(self.fetch_calls.get() + 1);
            Ok(vec![1, 2, 3])
        }

        async fn delete_recording(&self, id: i64) -> Result<(), ApiError> {
            if self.fail_delete {
                return Err(ApiError::Server {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            self.deleted.borrow_mut().push(id);
            Ok(())
        }
    }

    fn recording(id: i64, prompt: &str) -> Recording {
        serde_json::from_str(&format!(
            r#"{{"id": {id}, "filename": "recording_{id}.wav", "prompt": "{prompt}"}}"#
        ))
        .unwrap()
    }

    fn test_clip() -> AudioClip {
        let samples: Vec<i16> = (0..800).map(|i| (i % 128) as i16).collect();
        let bytes = encode_wav(&samples, 16000).unwrap();
        assert!(!bytes.is_empty());
        AudioClip::new(bytes, 16000, 0.05)
    }

    #[tokio::test]
    async fn analyze_failure_leaves_store_untouched_and_skips_refresh() {
        let api = StubApi {
            listing: vec![recording(1, "old")],
            fail_analyze: true,
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);
        pipeline.refresh().await;
        assert_eq!(pipeline.store().len(), 1);
        let list_calls_before = pipeline.api.list_calls.get();

        let outcome = pipeline.submit_recording(&test_clip(), "Describe your day").await;

        assert!(outcome.is_err());
        assert_eq!(pipeline.store().len(), 1);
        assert_eq!(pipeline.api.list_calls.get(), list_calls_before);
        assert!(pipeline.capture_error().is_some());
        assert!(pipeline.connection_error().is_none());
    }

    #[tokio::test]
    async fn successful_submit_refreshes_store_with_matching_prompt() {
        let api = StubApi {
            listing: vec![recording(2, "Describe your day"), recording(1, "old")],
            analyze_payload: r#"{"status": "success", "transcription": "hello",
                "grades": {"fluency": 0.8}}"#
                .to_string(),
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);

        let result = pipeline
            .submit_recording(&test_clip(), "Describe your day")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.grades.fluency, Some(0.8));
        assert_eq!(pipeline.store().len(), 2);
        assert_eq!(
            pipeline.store().by_index(1).unwrap().prompt.as_deref(),
            Some("Describe your day")
        );
    }

    #[tokio::test]
    async fn submit_with_unstructured_payload_still_succeeds() {
        let api = StubApi {
            analyze_payload: "internal gateway text, not json".to_string(),
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);

        let result = pipeline.submit_recording(&test_clip(), "p").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn refresh_failure_keeps_stale_listing() {
        let api = StubApi {
            listing: vec![recording(1, "p")],
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);
        pipeline.refresh().await;
        assert_eq!(pipeline.store().len(), 1);

        pipeline.api.fail_list = true;
        assert!(!pipeline.refresh().await);

        assert_eq!(pipeline.store().len(), 1);
        assert!(pipeline.connection_error().is_some());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_entry_in_order() {
        let api = StubApi {
            listing: vec![recording(3, "a"), recording(2, "b"), recording(1, "c")],
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);
        pipeline.refresh().await;

        assert!(pipeline.delete_recording(2).await.unwrap());

        let ids: Vec<i64> = pipeline.store().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(*pipeline.api.deleted.borrow(), vec![2]);
    }

    #[tokio::test]
    async fn failed_delete_leaves_collection_unchanged_and_surfaces_error() {
        let api = StubApi {
            listing: vec![recording(2, "a"), recording(1, "b")],
            fail_delete: true,
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);
        pipeline.refresh().await;

        assert!(pipeline.delete_recording(2).await.is_err());

        let ids: Vec<i64> = pipeline.store().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(pipeline.connection_error().is_some());
    }

    #[tokio::test]
    async fn duplicate_in_flight_delete_is_ignored() {
        let api = StubApi {
            listing: vec![recording(1, "a")],
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);
        pipeline.refresh().await;

        pipeline.deletes_in_flight.insert(1);
        assert!(!pipeline.delete_recording(1).await.unwrap());
        assert_eq!(pipeline.store().len(), 1);
        assert!(pipeline.api.deleted.borrow().is_empty());
    }

    #[tokio::test]
    async fn audio_fetches_are_memoized_per_filename() {
        let api = StubApi {
            listing: vec![recording(1, "a")],
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);
        pipeline.refresh().await;

        let first = pipeline.audio("recording_1.wav").await.unwrap().to_vec();
        let second = pipeline.audio("recording_1.wav").await.unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(pipeline.api.fetch_calls.get(), 1);
    }

    #[tokio::test]
    async fn deleting_releases_cached_audio() {
        let api = StubApi {
            listing: vec![recording(1, "a")],
            ..StubApi::default()
        };
        let mut pipeline = PracticePipeline::new(api);
        pipeline.refresh().await;

        pipeline.audio("recording_1.wav").await.unwrap();
        assert_eq!(pipeline.audio.len(), 1);

        pipeline.delete_recording(1).await.unwrap();
        assert_eq!(pipeline.audio.len(), 0);
    }
}
