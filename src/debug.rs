use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info};

use crate::errors::VqalignError;

pub mod messages {
    use serde::{Deserialize, Serialize};

    use crate::aligner::{AlignmentConfig, AlignmentResult};
    use crate::aligner::utils::{aligned_pairs, AlignedPair};

    #[derive(Debug, Serialize, Deserialize)]
    pub enum DebugOutputMessage {
        NewPair { pair_name: String, n1: usize, n2: usize, config: AlignmentConfig },
        AlignmentDone {
            total_cost: f64,
            path_length: usize,
            similarity: Option<f64>,
            stats: crate::aligner::SearchStats,
            aligned_pairs: Option<Vec<AlignedPair>>,
        },
        Terminate,
    }

    impl DebugOutputMessage {
        pub fn new_from_result(result: &AlignmentResult) -> Self {
            Self::AlignmentDone {
                total_cost: result.total_cost,
                path_length: result.path_length,
                similarity: result.similarity().ok(),
                stats: result.stats,
                aligned_pairs: result.edit_script.as_deref().map(aligned_pairs),
            }
        }
    }
}

/// Writes debug messages as JSON lines to files in a debug output directory, on a separate
/// thread.
pub struct DebugOutputWriter {
    transmitter: Sender<messages::DebugOutputMessage>,
    worker: DebugOutputWorker,
}

impl DebugOutputWriter {
    pub fn new<T: AsRef<Path> + Send>(debug_output_dir: T) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();

        Self { transmitter: tx, worker: DebugOutputWorker::new(debug_output_dir, rx) }
    }

    pub fn log(&self, msg: messages::DebugOutputMessage) {
        if let Err(e) = self.transmitter.send(msg) {
            error!("Could not log debug message! Cause: {e}")
        }
    }

    /// Signal the worker to finish and wait for it
    pub fn join(self) -> Result<(), VqalignError> {
        self.log(messages::DebugOutputMessage::Terminate);
        self.worker.join()
    }
}

fn write_msg(writer: &mut impl Write, msg: &messages::DebugOutputMessage) -> Result<(), VqalignError> {
    let json = serde_json::to_string(msg)?;
    writeln!(writer, "{json}")?;

    Ok(())
}

struct DebugOutputWorker {
    thread: JoinHandle<Result<(), VqalignError>>,
}

impl DebugOutputWorker {
    fn new<T: AsRef<Path> + Send>(debug_output_dir: T, receiver: Receiver<messages::DebugOutputMessage>) -> Self {
        let output_path = debug_output_dir.as_ref().to_path_buf();

        Self { thread: std::thread::spawn(move || {
            info!("Debug output directory: {}", output_path.display());
            std::fs::create_dir_all(&output_path)?;

            let mut output_file: Option<BufWriter<File>> = None;

            for msg in receiver {
                match msg {
                    messages::DebugOutputMessage::NewPair { ref pair_name, .. } => {
                        if let Some(mut prev) = output_file.take() {
                            prev.flush()?;
                        }

                        let mut file = File::create(output_path.join(format!("{pair_name}.jsonl")))
                            .map(BufWriter::new)?;
                        write_msg(&mut file, &msg)?;

                        output_file = Some(file);
                    },
                    messages::DebugOutputMessage::AlignmentDone { .. } => {
                        if let Some(file) = output_file.as_mut() {
                            write_msg(file, &msg)?;
                        } else {
                            error!("Alignment debug message received before a new pair was announced.");
                        }
                    },
                    messages::DebugOutputMessage::Terminate => break
                }
            }

            if let Some(mut file) = output_file {
                file.flush()?;
            }

            Ok(())
        })}
    }

    fn join(self) -> Result<(), VqalignError> {
        self.thread.join()
            .unwrap_or_else(|_| Err(VqalignError::IOError(
                std::io::Error::new(std::io::ErrorKind::Other, "debug output thread panicked"))))
    }
}
