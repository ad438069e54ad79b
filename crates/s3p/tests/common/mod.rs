//! In-process node used by the client tests.
//!
//! `FakeNode` implements the node side of the wire contract over an
//! in-memory transport: it parses each request frame the client
//! writes, serves it from a small register table and VMEM region, and
//! queues the response frame for the client's next read. Fault
//! injection knobs cover the failure paths (swallowed responses,
//! corrupted sequence, wrong response type).

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use binrw::BinWrite;
use binrw::io::Cursor;
use binrw::prelude::*;

use s3p::transport::TransportError;
use s3p::{
    CMD_PING, CMD_REBOOT, CancelToken, Client, ClientConfig, ErrorCode, MemType, Packet,
    PacketType, ReadRegsResponse, ReadStrRegResponse, RegFlags, RegInfoResponse, RegValue,
    RequestContent, S3pInfoResponse, Transport, Value, ValueType, VmemFlags, VmemInfoResponse,
    make_frame, parse_frame,
};

pub struct FakeReg {
    pub id: u16,
    pub group_id: u8,
    pub mutable: bool,
    pub persist: bool,
    pub name: &'static str,
    pub value: Value,
}

impl FakeReg {
    fn vt(&self) -> ValueType {
        self.value.value_type()
    }

    fn flags(&self) -> RegFlags {
        RegFlags::new()
            .with_mutable(self.mutable)
            .with_persist(self.persist)
    }
}

pub struct FakeVmemRow {
    pub idx: u8,
    pub mem_type: MemType,
    pub vstart: u32,
    pub flags: VmemFlags,
    pub mirror_type: MemType,
    pub name: &'static str,
    pub data: Vec<u8>,
}

impl FakeVmemRow {
    fn contains(&self, addr: u32, len: usize) -> bool {
        let end = u64::from(self.vstart) + self.data.len() as u64;
        u64::from(addr) >= u64::from(self.vstart) && u64::from(addr) + len as u64 <= end
    }
}

#[derive(Default)]
pub struct FakeNode {
    pub node_id: u8,
    pub regs: Vec<FakeReg>,
    pub vmem: Vec<FakeVmemRow>,

    // Fault injection.
    pub swallow_next: bool,
    pub corrupt_seq: bool,
    pub wrong_type: bool,
    /// Serve this many REG_INFO requests, then report NO_LOCK.
    pub fail_reg_info_after: Option<usize>,
    /// Set the token after serving this many REG_INFO requests.
    pub cancel_on_reg_info: Option<(usize, CancelToken)>,
    pub reg_info_served: usize,

    // Request log for transfer-shape assertions.
    pub vmem_reads: Vec<(u32, u16)>,
    pub vmem_writes: Vec<(u32, usize)>,
    pub exec_cmds: Vec<(u8, u32)>,
}

impl FakeNode {
    /// A node with a small mixed register table and two VMEM regions.
    pub fn demo(node_id: u8) -> FakeNode {
        FakeNode {
            node_id,
            regs: vec![
                FakeReg {
                    id: 10,
                    group_id: 2,
                    mutable: true,
                    persist: true,
                    name: "tx_power",
                    value: Value::U16(0x0102),
                },
                FakeReg {
                    id: 11,
                    group_id: 4,
                    mutable: false,
                    persist: false,
                    name: "temp",
                    value: Value::I16(-5),
                },
                FakeReg {
                    id: 42,
                    group_id: 1,
                    mutable: true,
                    persist: false,
                    name: "mode",
                    value: Value::U8(90),
                },
                FakeReg {
                    id: 300,
                    group_id: 8,
                    mutable: true,
                    persist: true,
                    name: "hostname",
                    value: Value::Str("node-a".into()),
                },
            ],
            vmem: vec![
                FakeVmemRow {
                    idx: 0,
                    mem_type: MemType::SNOR,
                    vstart: 0x1000_0000,
                    flags: VmemFlags::new().with_read(true).with_write(true),
                    mirror_type: MemType::NONE,
                    name: "boot",
                    data: (0..8192u32).map(|i| (i * 7 + 3) as u8).collect(),
                },
                FakeVmemRow {
                    idx: 1,
                    mem_type: MemType::FRAM,
                    vstart: 0x2000_0000,
                    flags: VmemFlags::new()
                        .with_read(true)
                        .with_write(true)
                        .with_mirror(true),
                    mirror_type: MemType::MRAM,
                    name: "config",
                    data: vec![0xFF; 256],
                },
            ],
            ..Default::default()
        }
    }

    /// Handles one delimiter-stripped request frame; `None` means no
    /// response goes out (not ours, malformed, or deliberately
    /// swallowed).
    pub fn handle(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        let pkt = parse_frame(frame, self.node_id).ok()?;
        if self.swallow_next {
            self.swallow_next = false;
            return None;
        }

        let request = {
            let mut cursor = Cursor::new(&pkt.data);
            RequestContent::read_be_args(&mut cursor, (&pkt.ptype,)).ok()?
        };

        let resp_type = if self.wrong_type {
            PacketType::S3pInfoResp
        } else {
            request.response_packet_type()
        };
        let (code, body) = self.dispatch(request);

        let mut data = vec![code.0];
        if code.is_ok() {
            data.extend_from_slice(&body);
        }

        let seq = if self.corrupt_seq {
            (pkt.seq() + 1) & 0x0F
        } else {
            pkt.seq()
        };
        let resp = Packet::new(self.node_id, pkt.src_id, seq, resp_type, data);
        Some(make_frame(&resp).unwrap())
    }

    fn dispatch(&mut self, request: RequestContent) -> (ErrorCode, Vec<u8>) {
        match request {
            RequestContent::ExecCmd(req) => {
                self.exec_cmds.push((req.cmd_id, req.arg));
                match req.cmd_id {
                    CMD_PING | CMD_REBOOT => (ErrorCode::NONE, vec![]),
                    _ => (ErrorCode::NO_CMD, vec![]),
                }
            }

            RequestContent::ReadRegs(req) => {
                let Some(start) = self.regs.iter().position(|r| r.id == req.first_id) else {
                    return (ErrorCode::NO_REG, vec![]);
                };
                let values: Vec<RegValue> = self.regs[start..]
                    .iter()
                    .filter(|reg| reg.value.is_scalar())
                    .take(usize::from(req.count))
                    .map(|reg| RegValue {
                        id: reg.id,
                        value: reg.value.clone(),
                    })
                    .collect();
                (ErrorCode::NONE, to_bytes(&ReadRegsResponse { values }))
            }

            RequestContent::WriteReg(req) => {
                let Some(reg) = self.regs.iter_mut().find(|r| r.id == req.reg_id) else {
                    return (ErrorCode::NO_REG, vec![]);
                };
                if req.value.value_type() != reg.vt() {
                    return (ErrorCode::TYPE, vec![]);
                }
                if !reg.mutable {
                    return (ErrorCode::NO_WRITE, vec![]);
                }
                reg.value = req.value;
                (ErrorCode::NONE, vec![])
            }

            RequestContent::ReadStrReg(req) => {
                let Some(reg) = self.regs.iter().find(|r| r.id == req.reg_id) else {
                    return (ErrorCode::NO_REG, vec![]);
                };
                let Value::Str(text) = &reg.value else {
                    return (ErrorCode::TYPE, vec![]);
                };
                let resp = ReadStrRegResponse {
                    reg_id: reg.id,
                    vt: ValueType::Str,
                    value: text.as_str().into(),
                };
                (ErrorCode::NONE, to_bytes(&resp))
            }

            RequestContent::WriteStrReg(req) => {
                let Some(reg) = self.regs.iter_mut().find(|r| r.id == req.reg_id) else {
                    return (ErrorCode::NO_REG, vec![]);
                };
                if reg.vt() != ValueType::Str {
                    return (ErrorCode::TYPE, vec![]);
                }
                if !reg.mutable {
                    return (ErrorCode::NO_WRITE, vec![]);
                }
                reg.value = Value::Str(String::from_utf8_lossy(&req.value.0).into_owned());
                (ErrorCode::NONE, vec![])
            }

            RequestContent::ReadVmem(req) => {
                self.vmem_reads.push((req.addr, req.size));
                let Some(row) = self
                    .vmem
                    .iter()
                    .find(|row| row.contains(req.addr, usize::from(req.size)))
                else {
                    return (ErrorCode::VMEM_XLATE, vec![]);
                };
                let offset = (req.addr - row.vstart) as usize;
                let bytes = row.data[offset..offset + usize::from(req.size)].to_vec();
                (ErrorCode::NONE, bytes)
            }

            RequestContent::WriteVmem(req) => {
                self.vmem_writes.push((req.addr, req.data.len()));
                let Some(row) = self
                    .vmem
                    .iter_mut()
                    .find(|row| row.contains(req.addr, req.data.len()))
                else {
                    return (ErrorCode::VMEM_XLATE, vec![]);
                };
                let offset = (req.addr - row.vstart) as usize;
                row.data[offset..offset + req.data.len()].copy_from_slice(&req.data);
                (ErrorCode::NONE, vec![])
            }

            RequestContent::S3pInfo(_) => {
                let resp = S3pInfoResponse {
                    version: s3p::PROTOCOL_VERSION,
                    reg_min_id: self.regs.first().map_or(0, |r| r.id),
                    reg_max_id: self.regs.iter().map(|r| r.id).max().unwrap_or(0),
                    regs_cnt: self.regs.len() as u16,
                    vmem_rows: self.vmem.len() as u8,
                };
                (ErrorCode::NONE, to_bytes(&resp))
            }

            RequestContent::RegInfo(req) => {
                if let Some(limit) = self.fail_reg_info_after {
                    if self.reg_info_served >= limit {
                        return (ErrorCode::NO_LOCK, vec![]);
                    }
                }
                self.reg_info_served += 1;
                if let Some((limit, token)) = &self.cancel_on_reg_info {
                    if self.reg_info_served >= *limit {
                        token.cancel();
                    }
                }

                let Some(pos) = self.regs.iter().position(|r| r.id == req.reg_id) else {
                    return (ErrorCode::NO_REG, vec![]);
                };
                let reg = &self.regs[pos];
                let resp = RegInfoResponse {
                    id: reg.id,
                    next_id: self.regs.get(pos + 1).map_or(0, |r| r.id),
                    vt: reg.vt(),
                    group_id: reg.group_id,
                    flags: reg.flags(),
                    name: reg.name.into(),
                };
                (ErrorCode::NONE, to_bytes(&resp))
            }

            RequestContent::VmemInfo(req) => {
                let Some(pos) = self
                    .vmem
                    .iter()
                    .position(|row| row.idx == req.row_idx)
                else {
                    return (ErrorCode::NO_VMEM, vec![]);
                };
                let row = &self.vmem[pos];
                let resp = VmemInfoResponse {
                    idx: row.idx,
                    next_idx: self.vmem.get(pos + 1).map_or(0, |r| r.idx),
                    mem_type: row.mem_type,
                    vstart: row.vstart,
                    size: row.data.len() as u32,
                    flags: row.flags,
                    mirror_type: row.mirror_type,
                    name: row.name.into(),
                };
                (ErrorCode::NONE, to_bytes(&resp))
            }
        }
    }
}

fn to_bytes<T: for<'a> BinWrite<Args<'a> = ()>>(value: &T) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    value.write_be(&mut cursor).unwrap();
    cursor.into_inner()
}

/// Transport that hands every completed request frame to a [`FakeNode`]
/// and serves its response bytes back.
pub struct NodeTransport {
    node: Rc<RefCell<FakeNode>>,
    inbox: Vec<u8>,
    outbox: VecDeque<u8>,
}

impl NodeTransport {
    pub fn new(node: Rc<RefCell<FakeNode>>) -> NodeTransport {
        NodeTransport {
            node,
            inbox: Vec::new(),
            outbox: VecDeque::new(),
        }
    }
}

impl Transport for NodeTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        for &byte in buf {
            if byte == s3p::COBS_DELIM {
                let frame = std::mem::take(&mut self.inbox);
                if let Some(resp) = self.node.borrow_mut().handle(&frame) {
                    self.outbox.extend(resp);
                }
            } else {
                self.inbox.push(byte);
            }
        }
        Ok(buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = buf.len().min(self.outbox.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.outbox.pop_front().unwrap();
        }
        Ok(n)
    }

    fn discard(&mut self) -> Result<(), TransportError> {
        self.outbox.clear();
        Ok(())
    }
}

/// Fast test timings: real waits are pointless against an in-memory
/// node.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        response_timeout: Duration::from_millis(100),
        poll_interval: Duration::from_millis(1),
        ..Default::default()
    }
}

/// A client wired to a demo node; the node handle stays out for
/// assertions and fault injection.
pub fn harness() -> (Client, Rc<RefCell<FakeNode>>) {
    let config = test_config();
    let node = Rc::new(RefCell::new(FakeNode::demo(config.node_id)));
    let transport = NodeTransport::new(node.clone());
    let client = Client::new(Box::new(transport), config).unwrap();
    (client, node)
}
