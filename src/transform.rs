//! The driver: parses class bytes, runs the stage chain, serializes the
//! result, and tracks what has already been transformed.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::classfile::parse::ClassFileParser;
use crate::classfile::write::ClassFileWriter;
use crate::error::TransformError;
use crate::pipeline;
use crate::structs::record::ClassRecord;

/// Explicit configuration handed to the driver at construction. When
/// `dump_path` is set, every transformed class is also written there for
/// diagnostics.
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    pub dump_path: Option<PathBuf>,
}

/// The result of one successful class transform.
#[derive(Debug)]
pub struct TransformedClass {
    pub class_name: String,
    pub bytes: Vec<u8>,
    pub record: ClassRecord,
}

struct ClassDigests {
    original: String,
    transformed: String,
}

/// Owns the fixed four-stage chain. One instance may serve many classes,
/// from many threads; each pass allocates its own record and metadata, and
/// the only shared state is the lock-guarded digest registry.
pub struct Transformer {
    config: TransformConfig,
    seen: RwLock<HashMap<String, ClassDigests>>,
}

impl Transformer {
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            seen: RwLock::new(HashMap::new()),
        }
    }

    /// Transforms one class definition. A failure here is scoped to this
    /// class; the transformer stays usable for others.
    pub fn transform(&self, data: &[u8]) -> Result<TransformedClass> {
        let digest = sha256_hex(data);

        let parsed = ClassFileParser::from_bytes(data).parse()?;
        let class_name = parsed.class_name()?.to_string();

        // Running the chain twice over one class would duplicate the
        // reserved members, so recognise our own output (and repeated
        // input) before the pipeline sees it.
        {
            let seen = self.seen.read();
            if let Some(prev) = seen.get(&class_name) {
                if prev.transformed == digest || prev.original == digest {
                    return Err(TransformError::AlreadyTransformed {
                        class: class_name,
                        digest,
                    }
                    .into());
                }
            }
        }

        let mut record = ClassRecord::new(class_name.clone());
        let events = pipeline::transform_events(parsed.events, &mut record)?;
        let bytes = ClassFileWriter::new(parsed.pool).write(&events)?;

        self.seen.write().insert(
            class_name.clone(),
            ClassDigests {
                original: digest,
                transformed: sha256_hex(&bytes),
            },
        );

        if let Some(dump_path) = &self.config.dump_path {
            dump(dump_path, &class_name, &bytes);
        }

        info!(
            "transformed '{}' ({} -> {} bytes, {} fields recorded)",
            class_name,
            data.len(),
            bytes.len(),
            record.fields().len()
        );

        Ok(TransformedClass {
            class_name,
            bytes,
            record,
        })
    }
}

/// Diagnostic dumping never fails a transform; a class we could not write to
/// disk is still a class we instrumented.
fn dump(dump_path: &std::path::Path, class_name: &str, bytes: &[u8]) {
    let file_name = format!("{}.class", class_name.replace('/', "."));
    let target = dump_path.join(file_name);

    match fs::write(&target, bytes) {
        Ok(()) => debug!("dumped '{}' to '{}'", class_name, target.display()),
        Err(err) => warn!(
            "failed to dump '{}' to '{}': {}",
            class_name,
            target.display(),
            err
        ),
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
