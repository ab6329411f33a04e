/*!
Thread-local error status plane for the filtering VM.

Mirrors the decoder's plain `enum ... Error` convention (see [crate::error::ParserError])
rather than a panic/unwind based design: every fallible VM or trie operation is expected
to set the plane exactly once via [set_err_stat] at its exit, and callers may either
inspect the returned `Result` or install a [ErrorHandler] to be notified out of band.
*/
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};

/// Error codes raised by the VM, the Patricia trie, and the NFA compiler/simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmErrorCode {
    /// No error; the previous operation completed cleanly.
    NoErr,
    /// The VM has `setup_failed` latched and cannot execute.
    BadVmState,
    /// `Vm::exec` was called with an empty program.
    EmptyProgram,
    /// A match expression could not be evaluated to a boolean.
    BadMatchExpr,
    /// The AS-path regex compiled to a program larger than the bound `6 * n` instructions,
    /// or the simulator exceeded its retry capacity.
    NfaTooComplex,
    /// Regex group nesting exceeded the 32-group limit.
    GroupLimit,
    /// `JZ`/`JNZ` target fell outside `0..=prog_len`.
    BadJump,
    /// Opcode byte does not correspond to a known instruction, or is a reserved opcode
    /// (`FASMTC`, `ORPASS`, `ORFAIL`, `MOVK`; see spec.md §9 Open Question).
    IllegalInstruction,
    /// Heap arena exhausted (permanent or temporary allocation).
    HeapExhausted,
    /// `ENDBLK` with no open `BLK`.
    UnmatchedEndblk,
    /// Evaluation stack overflowed the region between `h_low_mark` and `h_high_mark`.
    StackOverflow,
    /// Popped from an empty evaluation stack.
    StackUnderflow,
    /// `LOADK`/`CALL` operand indexed past `nk`/`nfuncs`.
    BadIndex,
    /// Otherwise-malformed instruction operand (e.g. unknown network-op source selector).
    BadOperand,
    /// Failure while the VM consulted the underlying decoded message (component D).
    MsgAccessError,
    /// A VM-level error previously latched by [set_err_stat]; new non-VM errors must not
    /// overwrite it until it is explicitly cleared.
    VmMsgErr,
}

impl Display for VmErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            VmErrorCode::NoErr => "no error",
            VmErrorCode::BadVmState => "VM setup failed; refusing to execute",
            VmErrorCode::EmptyProgram => "empty VM program",
            VmErrorCode::BadMatchExpr => "bad match expression",
            VmErrorCode::NfaTooComplex => "AS-path regex too complex",
            VmErrorCode::GroupLimit => "AS-path regex group nesting limit exceeded",
            VmErrorCode::BadJump => "jump target out of range",
            VmErrorCode::IllegalInstruction => "illegal or reserved VM instruction",
            VmErrorCode::HeapExhausted => "VM heap arena exhausted",
            VmErrorCode::UnmatchedEndblk => "ENDBLK with no open BLK",
            VmErrorCode::StackOverflow => "VM evaluation stack overflow",
            VmErrorCode::StackUnderflow => "VM evaluation stack underflow",
            VmErrorCode::BadIndex => "constant or function index out of range",
            VmErrorCode::BadOperand => "bad instruction operand",
            VmErrorCode::MsgAccessError => "error accessing underlying BGP message",
            VmErrorCode::VmMsgErr => "previously latched VM error",
        };
        write!(f, "{s}")
    }
}

impl std::error::Error for VmErrorCode {}

/// Source location attached to an error report, in the spirit of spec.md §4.K.
#[derive(Debug, Clone, Copy)]
pub struct ErrLoc {
    pub file: &'static str,
    pub line: u32,
}

/// A pluggable error handler. Invoked with the latched code and the call site that raised
/// it; may be used for logging, metrics, or (via [ErrorHandler::Abort]) process termination.
pub enum ErrorHandler {
    /// No handler installed; errors are only reported through return values.
    None,
    /// Invoke a user callback.
    Callback(Box<dyn Fn(VmErrorCode, ErrLoc) + Send>),
    /// Terminate the process with a backtrace and the error string (spec.md §4.K item 2).
    Abort,
}

struct ErrPlane {
    code: VmErrorCode,
    handler: ErrorHandler,
}

impl Default for ErrPlane {
    fn default() -> Self {
        ErrPlane {
            code: VmErrorCode::NoErr,
            handler: ErrorHandler::None,
        }
    }
}

thread_local! {
    static ERR_PLANE: RefCell<ErrPlane> = RefCell::new(ErrPlane::default());
}

/// Overwrite the thread-local error code and invoke the installed handler, per spec.md §4.K:
/// 1. overwrite `code`, except when the *previously latched* code is [VmErrorCode::VmMsgErr]
///    (which a plain decoder-level error must not clobber);
/// 2. `NoErr` returns `Ok(())`; any other code invokes the handler (if any) and returns `Err`.
pub fn set_err_stat(code: VmErrorCode, loc: ErrLoc) -> Result<(), VmErrorCode> {
    ERR_PLANE.with(|cell| {
        let mut plane = cell.borrow_mut();
        if plane.code != VmErrorCode::VmMsgErr {
            plane.code = code;
        }
        match plane.code {
            VmErrorCode::NoErr => Ok(()),
            other => {
                match &plane.handler {
                    ErrorHandler::None => {}
                    ErrorHandler::Callback(f) => f(other, loc),
                    ErrorHandler::Abort => {
                        panic!("fatal VM error at {}:{}: {other}", loc.file, loc.line);
                    }
                }
                Err(other)
            }
        }
    })
}

/// Read back the last latched error code without clearing it.
pub fn last_err_stat() -> VmErrorCode {
    ERR_PLANE.with(|cell| cell.borrow().code)
}

/// Clear the latched error back to [VmErrorCode::NoErr].
pub fn clear_err_stat() {
    ERR_PLANE.with(|cell| cell.borrow_mut().code = VmErrorCode::NoErr);
}

/// Install (or remove, with [ErrorHandler::None]) the thread's error handler.
pub fn set_error_handler(handler: ErrorHandler) {
    ERR_PLANE.with(|cell| cell.borrow_mut().handler = handler);
}

/// Convenience macro capturing the call site as an [ErrLoc].
#[macro_export]
macro_rules! here {
    () => {
        $crate::vm::error_plane::ErrLoc {
            file: file!(),
            line: line!(),
        }
    };
}
