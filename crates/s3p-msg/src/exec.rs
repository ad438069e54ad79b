//! Exec command request/response messages.

use binrw::helpers::until_eof;
use binrw::prelude::*;

/// Ping command id for [`ExecCmdRequest`].
pub const CMD_PING: u8 = 0x10;
/// Reboot command id for [`ExecCmdRequest`].
pub const CMD_REBOOT: u8 = 0x11;

/// Executes a named command on the node: 1-byte command id plus a
/// 32-bit argument. PING ignores the argument; REBOOT acknowledges and
/// then resets, so no further traffic is expected.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct ExecCmdRequest {
    pub cmd_id: u8,
    pub arg: u32,
}

/// Payload after the status code is command-defined; it is handed back
/// to the caller verbatim.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ExecCmdResponse {
    #[br(parse_with = until_eof)]
    pub data: Vec<u8>,
}
