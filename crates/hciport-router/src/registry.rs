use bytes::Bytes;
use hciport_term::Term;
use hciport_transport::HciOpener;
use tracing::{debug, warn};

use crate::lifecycle::HardwareChannel;

/// Operations callable over the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    Close,
    IsDevUp,
    DevIdFor,
    BindRaw,
    SendCommand,
    SetFilter,
    Foo,
    Bar,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Init,
        Operation::Close,
        Operation::IsDevUp,
        Operation::DevIdFor,
        Operation::BindRaw,
        Operation::SendCommand,
        Operation::SetFilter,
        Operation::Foo,
        Operation::Bar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Init => "hci_init",
            Operation::Close => "hci_close",
            Operation::IsDevUp => "hci_is_dev_up",
            Operation::DevIdFor => "hci_dev_id_for",
            Operation::BindRaw => "hci_bind_raw",
            Operation::SendCommand => "hci_send_command",
            Operation::SetFilter => "hci_set_filter",
            Operation::Foo => "foo",
            Operation::Bar => "bar",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Operation::Init | Operation::Close | Operation::IsDevUp => 0,
            _ => 1,
        }
    }

    /// Exact-match lookup by name.
    pub fn from_name(name: &str) -> Option<Operation> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    fn bind(self, args: &[Term]) -> Option<Call> {
        if args.len() != self.arity() {
            return None;
        }
        let call = match self {
            Operation::Init => Call::Init,
            Operation::Close => Call::Close,
            Operation::IsDevUp => Call::IsDevUp,
            Operation::DevIdFor => Call::DevIdFor {
                is_up: flag(&args[0])?,
            },
            Operation::BindRaw => Call::BindRaw {
                dev_id: if args[0].is_nil() {
                    None
                } else {
                    Some(u16::try_from(args[0].as_integer()?).ok()?)
                },
            },
            Operation::SendCommand => Call::SendCommand(args[0].as_binary()?.clone()),
            Operation::SetFilter => Call::SetFilter(args[0].as_binary()?.clone()),
            Operation::Foo => Call::Foo(args[0].as_integer()?),
            Operation::Bar => Call::Bar(args[0].as_integer()?),
        };
        Some(call)
    }
}

fn flag(term: &Term) -> Option<bool> {
    term.as_bool().or_else(|| match term.as_integer()? {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    })
}

/// A validated operation call with its decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init,
    Close,
    IsDevUp,
    DevIdFor { is_up: bool },
    BindRaw { dev_id: Option<u16> },
    SendCommand(Bytes),
    SetFilter(Bytes),
    Foo(i64),
    Bar(i64),
}

/// Why a request body could not be turned into a [`Call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Body is not `{Name, Args}`, or the args do not fit the operation.
    BadArgs,
    /// No operation with this name.
    Unknown(String),
}

impl Call {
    /// Interpret a request body of the form `{Name, [Arg, ...]}`.
    pub fn from_term(body: &Term) -> Result<Call, CallError> {
        let [name, args] = body.as_tuple().ok_or(CallError::BadArgs)? else {
            return Err(CallError::BadArgs);
        };
        let name = name.as_atom().ok_or(CallError::BadArgs)?;
        let op = Operation::from_name(name).ok_or_else(|| CallError::Unknown(name.to_string()))?;
        let args = args.as_list().ok_or(CallError::BadArgs)?;
        op.bind(args).ok_or(CallError::BadArgs)
    }

    pub fn operation(&self) -> Operation {
        match self {
            Call::Init => Operation::Init,
            Call::Close => Operation::Close,
            Call::IsDevUp => Operation::IsDevUp,
            Call::DevIdFor { .. } => Operation::DevIdFor,
            Call::BindRaw { .. } => Operation::BindRaw,
            Call::SendCommand(_) => Operation::SendCommand,
            Call::SetFilter(_) => Operation::SetFilter,
            Call::Foo(_) => Operation::Foo,
            Call::Bar(_) => Operation::Bar,
        }
    }
}

/// Resolve and run one request body, producing its result value.
///
/// Never fails: every outcome, including an unusable body, is a value.
pub fn handle<O: HciOpener>(body: &Term, channel: &mut HardwareChannel<O>) -> Term {
    match Call::from_term(body) {
        Ok(call) => dispatch(call, channel),
        Err(CallError::Unknown(name)) => {
            warn!(operation = %name, "unknown operation");
            Term::error("undef")
        }
        Err(CallError::BadArgs) => {
            warn!(body = ?body, "malformed operation call");
            Term::error("badarg")
        }
    }
}

/// Run a validated call against the hardware channel.
pub fn dispatch<O: HciOpener>(call: Call, channel: &mut HardwareChannel<O>) -> Term {
    let op = call.operation().name();
    debug!(op, "dispatch");
    match call {
        Call::Init => match channel.open() {
            Ok(()) => Term::ok(),
            Err(err) => {
                warn!(op, error = %err, "hci socket open failed");
                Term::atom("error")
            }
        },
        Call::Close => {
            channel.close();
            Term::Integer(0)
        }
        Call::IsDevUp => match channel.is_dev_up() {
            Ok(up) => Term::boolean(up),
            Err(err) => {
                warn!(op, error = %err, "device status query failed");
                Term::boolean(false)
            }
        },
        Call::DevIdFor { is_up } => match channel.dev_id_for(is_up) {
            Ok(Some(dev_id)) => Term::Integer(i64::from(dev_id)),
            Ok(None) => Term::nil(),
            Err(err) => {
                warn!(op, error = %err, "device enumeration failed");
                Term::nil()
            }
        },
        Call::BindRaw { dev_id } => match channel.bind_raw(dev_id) {
            Ok(dev_id) => Term::Integer(i64::from(dev_id)),
            Err(err) => {
                warn!(op, error = %err, "bind failed");
                Term::nil()
            }
        },
        Call::SendCommand(data) => match channel.send(&data) {
            Ok(_) => Term::ok(),
            Err(err) => {
                warn!(op, len = data.len(), error = %err, "send failed");
                Term::reason(&err.reason())
            }
        },
        Call::SetFilter(filter) => match channel.set_filter(&filter) {
            Ok(()) => Term::ok(),
            Err(err) => {
                warn!(op, error = %err, "set filter failed");
                Term::reason(&err.reason())
            }
        },
        Call::Foo(x) => Term::Integer(x.wrapping_add(1)),
        Call::Bar(y) => Term::Integer(y.wrapping_mul(2)),
    }
}
