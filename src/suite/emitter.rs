// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::sync::atomic::{self, Ordering};
use std::sync::Arc;

use crate::schema;
use crate::suite::config;
use crate::suite::writer::WriterType;

/// Serializes artifacts one per line, stamping each with the time and a
/// sequence number.
pub struct JsonEmitter {
    timestamp_provider: Box<dyn config::TimestampProvider + Send + Sync + 'static>,
    writer: WriterType,
    seqno: Arc<atomic::AtomicU64>,
}

impl JsonEmitter {
    pub(crate) fn new(
        timestamp_provider: Box<dyn config::TimestampProvider + Send + Sync + 'static>,
        writer: WriterType,
    ) -> Self {
        JsonEmitter {
            timestamp_provider,
            writer,
            seqno: Arc::new(atomic::AtomicU64::new(0)),
        }
    }

    fn incr_seqno(&self) -> u64 {
        self.seqno.fetch_add(1, Ordering::AcqRel)
    }

    fn serialize_artifact(&self, object: &schema::RootImpl) -> String {
        let root = schema::Root {
            artifact: object.clone(),
            timestamp: self.timestamp_provider.now(),
            seqno: self.incr_seqno(),
        };

        serde_json::json!(root).to_string()
    }

    pub fn timestamp_provider(&self) -> &(dyn config::TimestampProvider + Send + Sync + 'static) {
        &*self.timestamp_provider
    }

    /// Writes a line of the text report, bypassing serialization.
    pub async fn write_text(&self, s: &str) -> Result<(), io::Error> {
        self.writer.write_line(s).await
    }

    pub async fn emit(&self, object: &schema::RootImpl) -> Result<(), io::Error> {
        let s = self.serialize_artifact(object);
        self.writer.write_line(&s).await
    }

    pub async fn emit_run(&self, artifact: schema::TestRunArtifactImpl) -> Result<(), io::Error> {
        self.emit(&schema::RootImpl::TestRunArtifact(schema::TestRunArtifact {
            artifact,
        }))
        .await
    }

    pub async fn emit_step(
        &self,
        id: &str,
        artifact: schema::TestStepArtifactImpl,
    ) -> Result<(), io::Error> {
        self.emit(&schema::RootImpl::TestStepArtifact(schema::TestStepArtifact {
            id: id.to_owned(),
            artifact,
        }))
        .await
    }
}
