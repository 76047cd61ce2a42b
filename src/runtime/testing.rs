//! Shared helpers for runtime tests.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use serde_json::Value;

use super::protocol::read_frame;

/// Writer whose bytes stay inspectable after being boxed into an `Outbox`.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    /// Decode every frame written so far.
    pub fn messages(&self) -> Vec<Value> {
        let bytes = self.0.borrow().clone();
        let mut reader = io::Cursor::new(bytes);
        let mut out = Vec::new();
        while let Some(frame) = read_frame(&mut reader).unwrap() {
            out.push(serde_json::from_slice(&frame).unwrap());
        }
        out
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}
