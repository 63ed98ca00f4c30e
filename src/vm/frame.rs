//! Execution frames.
//!
//! A [`Frame`] is the execution-stack object the host VM hands to every dispatch: the function
//! owning the executing code (the *node*), the code bytes themselves, a cursor into them, and the
//! call's locals. For calls originating from script code the cursor sits just past a 32-bit word
//! encoding which target was invoked, either the callee's token (runtime-dispatched) or an
//! interned-name reference (late-bound), with nothing in the frame saying which. Frames built for
//! host-originated events carry no code at all; their node *is* the invoked target.

use crate::vm::{FunctionRc, FunctionToken, Name, Value};

/// Size of an encoded call-site reference in the code stream
const CALL_WORD: usize = 4;

/// The execution-stack object passed to every dispatch.
pub struct Frame {
    node: FunctionRc,
    code: Vec<u8>,
    cursor: usize,
    locals: Vec<Value>,
}

impl Frame {
    /// Creates a frame over an arbitrary code stream.
    ///
    /// `cursor` is clamped to the code length; host interpreters position it just past the
    /// encoded reference of the call being dispatched.
    #[must_use]
    pub fn new(node: FunctionRc, code: Vec<u8>, cursor: usize, locals: Vec<Value>) -> Self {
        let cursor = cursor.min(code.len());
        Frame {
            node,
            code,
            cursor,
            locals,
        }
    }

    /// Frame for a host-originated event invocation of `node`.
    ///
    /// Carries no code, so call-target recovery falls back to the node itself.
    #[must_use]
    pub fn event(node: FunctionRc, locals: Vec<Value>) -> Self {
        Frame {
            node,
            code: Vec::new(),
            cursor: 0,
            locals,
        }
    }

    /// Frame whose call site encodes the callee as a direct target token.
    #[must_use]
    pub fn bound_call(node: FunctionRc, callee: FunctionToken, locals: Vec<Value>) -> Self {
        let code = callee.value().to_le_bytes().to_vec();
        Frame {
            node,
            cursor: code.len(),
            code,
            locals,
        }
    }

    /// Frame whose call site encodes the callee as an interned-name reference.
    #[must_use]
    pub fn named_call(node: FunctionRc, callee: Name, locals: Vec<Value>) -> Self {
        let code = callee.raw().to_le_bytes().to_vec();
        Frame {
            node,
            cursor: code.len(),
            code,
            locals,
        }
    }

    /// The function owning the executing code (for event frames, the invoked target itself)
    #[must_use]
    pub fn node(&self) -> &FunctionRc {
        &self.node
    }

    /// The call's locals
    #[must_use]
    pub fn locals(&self) -> &[Value] {
        &self.locals
    }

    /// Current cursor position within the code stream
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reads the fixed-size word immediately preceding the cursor.
    ///
    /// This is the speculative read at the heart of call-target recovery: the word is either a
    /// token or a name reference, and the reader must try both. Returns `None` when the cursor
    /// does not have a full word behind it (event frames).
    #[must_use]
    pub fn read_call_word(&self) -> Option<u32> {
        let start = self.cursor.checked_sub(CALL_WORD)?;
        let bytes = self.code.get(start..self.cursor)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("node", &self.node.friendly_name())
            .field("cursor", &self.cursor)
            .field("locals", &self.locals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Runtime;

    fn node() -> FunctionRc {
        let runtime = Runtime::new();
        let class = runtime
            .class("Pawn")
            .function("Tick", |_, _, _| Ok(()))
            .register()
            .unwrap();
        let instance = runtime.spawn(&class, "pawn");
        instance.find_function_checked("Tick").unwrap()
    }

    #[test]
    fn event_frames_have_no_call_word() {
        let frame = Frame::event(node(), vec![]);
        assert_eq!(frame.read_call_word(), None);
    }

    #[test]
    fn bound_call_encodes_the_token() {
        let token = FunctionToken::new(0x0600_002A);
        let frame = Frame::bound_call(node(), token, vec![]);
        assert_eq!(frame.read_call_word(), Some(token.value()));
    }

    #[test]
    fn named_call_encodes_the_reference() {
        let frame = Frame::named_call(node(), Name::from_raw(7), vec![]);
        assert_eq!(frame.read_call_word(), Some(7));
    }

    #[test]
    fn cursor_is_clamped() {
        let frame = Frame::new(node(), vec![1, 2], 100, vec![]);
        assert_eq!(frame.cursor(), 2);
        // Two bytes are not a full call word.
        assert_eq!(frame.read_call_word(), None);
    }

    #[test]
    fn locals_are_preserved() {
        let frame = Frame::event(node(), vec![Value::Int(3), Value::Bool(true)]);
        assert_eq!(frame.locals().len(), 2);
        assert_eq!(frame.locals()[0], Value::Int(3));
    }
}
