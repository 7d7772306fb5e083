//! The host application the selection is sent to.
//!
//! Whether a host is reachable is decided once at startup. Without a host,
//! emitted payloads stay local: they are logged and handed back to the caller
//! so they can be shown and printed on exit.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::domain::GridError;
use crate::export::SelectionPayload;

pub const HOST_ABSENT_NOTICE: &str = "Host context not detected.";

pub trait HostBridge {
    fn notify_ready(&mut self) -> Result<(), GridError>;
    fn send_payload(&mut self, serialized: &str) -> Result<(), GridError>;
    fn close_view(&mut self) -> Result<(), GridError>;
    fn haptic_impact(&mut self, _style: &str) {}
}

/// Writes each payload as one JSON line to a file.
pub struct FileBridge {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileBridge {
    pub fn new(path: PathBuf) -> Self {
        FileBridge { path, writer: None }
    }
}

impl HostBridge for FileBridge {
    fn notify_ready(&mut self) -> Result<(), GridError> {
        let file = File::create(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        info!("Host ready, sending to {}", self.path.display());
        Ok(())
    }

    fn send_payload(&mut self, serialized: &str) -> Result<(), GridError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| GridError::HostFailed("bridge was never made ready".into()))?;
        writeln!(writer, "{serialized}")?;
        writer.flush()?;
        Ok(())
    }

    fn close_view(&mut self) -> Result<(), GridError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// What happened to an emitted payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// The host took the payload and closed the view.
    Delivered,
    /// The payload stayed local. Carries the notice to show and the serialized payload.
    Local { notice: String, payload: String },
}

pub enum Host {
    Present(Box<dyn HostBridge>),
    Absent,
}

impl Host {
    pub fn detect(send_to: Option<PathBuf>) -> Self {
        match send_to {
            Some(path) => Host::Present(Box::new(FileBridge::new(path))),
            None => {
                info!("No host configured, selections stay local");
                Host::Absent
            }
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Host::Present(_))
    }

    /// A bridge that fails to start is demoted to `Absent` for the rest of the session.
    pub fn notify_ready(&mut self) {
        let failed = match self {
            Host::Present(bridge) => bridge.notify_ready().err(),
            Host::Absent => None,
        };
        if let Some(e) = failed {
            warn!("Host did not become ready: {e}");
            *self = Host::Absent;
        }
    }

    /// Never fails. Anything the host can not take is kept local.
    pub fn emit(&mut self, payload: &SelectionPayload) -> Emission {
        let serialized = match payload.to_json() {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not serialize payload: {e}");
                format!("{payload:?}")
            }
        };

        let notice = match self {
            Host::Present(bridge) => {
                bridge.haptic_impact("medium");
                match bridge.send_payload(&serialized) {
                    Ok(()) => {
                        info!("Sent {} rows to host", payload.count);
                        if let Err(e) = bridge.close_view() {
                            warn!("Host failed to close the view: {e}");
                        }
                        return Emission::Delivered;
                    }
                    Err(e) => {
                        warn!("Sending to host failed: {e}");
                        format!("Sending failed ({e}), kept {} rows locally.", payload.count)
                    }
                }
            }
            Host::Absent => HOST_ABSENT_NOTICE.to_string(),
        };

        info!("Selection payload: {serialized}");
        Emission::Local {
            notice,
            payload: serialized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        ready: bool,
        sent: Vec<String>,
        closed: bool,
        haptics: usize,
    }

    struct MemoryBridge {
        log: Rc<RefCell<Recorded>>,
        fail: bool,
    }

    impl HostBridge for MemoryBridge {
        fn notify_ready(&mut self) -> Result<(), GridError> {
            self.log.borrow_mut().ready = true;
            Ok(())
        }

        fn send_payload(&mut self, serialized: &str) -> Result<(), GridError> {
            if self.fail {
                return Err(GridError::HostFailed("unreachable".into()));
            }
            self.log.borrow_mut().sent.push(serialized.to_string());
            Ok(())
        }

        fn close_view(&mut self) -> Result<(), GridError> {
            self.log.borrow_mut().closed = true;
            Ok(())
        }

        fn haptic_impact(&mut self, _style: &str) {
            self.log.borrow_mut().haptics += 1;
        }
    }

    fn payload() -> SelectionPayload {
        let mut data = Dataset::sample();
        data.set_selected(1001, true);
        SelectionPayload::new(data.collect_selection(), 1)
    }

    #[test]
    fn absent_host_keeps_payload_local() {
        let mut host = Host::detect(None);
        assert!(!host.is_present());
        host.notify_ready();
        match host.emit(&payload()) {
            Emission::Local { notice, payload } => {
                assert_eq!(notice, HOST_ABSENT_NOTICE);
                assert!(payload.starts_with(r#"{"type":"selection""#));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn present_host_receives_payload_and_closes() {
        let log = Rc::new(RefCell::new(Recorded::default()));
        let mut host = Host::Present(Box::new(MemoryBridge {
            log: Rc::clone(&log),
            fail: false,
        }));
        host.notify_ready();
        assert_eq!(host.emit(&payload()), Emission::Delivered);
        let log = log.borrow();
        assert!(log.ready && log.closed);
        assert_eq!(log.haptics, 1);
        assert_eq!(log.sent.len(), 1);
        assert_eq!(SelectionPayload::from_json(&log.sent[0]).unwrap(), payload());
    }

    #[test]
    fn failing_host_falls_back_to_local() {
        let log = Rc::new(RefCell::new(Recorded::default()));
        let mut host = Host::Present(Box::new(MemoryBridge {
            log: Rc::clone(&log),
            fail: true,
        }));
        let emission = host.emit(&payload());
        assert!(matches!(emission, Emission::Local { .. }));
        assert!(!log.borrow().closed);
    }

    #[test]
    fn file_bridge_writes_one_line_per_payload() {
        let path = std::env::temp_dir().join(format!("tv-grid-host-{}.jsonl", std::process::id()));
        let mut host = Host::detect(Some(path.clone()));
        host.notify_ready();
        assert_eq!(host.emit(&payload()), Emission::Delivered);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert_eq!(SelectionPayload::from_json(written.trim()).unwrap(), payload());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn file_bridge_without_ready_is_not_delivered() {
        let mut host = Host::Present(Box::new(FileBridge::new(PathBuf::from("unused.jsonl"))));
        assert!(matches!(host.emit(&payload()), Emission::Local { .. }));
    }
}
