use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use super::{path, Fixture};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn compile_events_are_filtered_by_their_dotted_target() {
    let fx = Fixture::new(&[("Main.kt", "val x = 1")]);
    let captured = Captured::default();
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new("off,kls.db=debug"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(captured.clone())
                .with_ansi(false),
        );

    let compiled = tracing::subscriber::with_default(subscriber, || {
        fx.source_path.current_version(&path("Main.kt"))
    });
    assert!(compiled.is_some());

    let text = captured.text();
    assert!(text.contains("kls.db"), "{text}");
    assert!(text.contains("compiling"), "{text}");
    assert!(!text.contains("kls_db::"), "{text}");
}

#[test]
fn other_targets_do_not_enable_compile_events() {
    let fx = Fixture::new(&[("Main.kt", "val x = 1")]);
    let captured = Captured::default();
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new("off,kls_db=debug"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(captured.clone())
                .with_ansi(false),
        );

    tracing::subscriber::with_default(subscriber, || {
        fx.source_path.current_version(&path("Main.kt"))
    });
    assert_eq!(captured.text(), "");
}
