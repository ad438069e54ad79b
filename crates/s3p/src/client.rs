//! The transaction engine: one outstanding request at a time, matched
//! responses, chunked bulk transfer and cancellable metadata walks.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use binrw::io::Cursor;
use binrw::prelude::*;

use s3p_msg::{
    CMD_PING, CMD_REBOOT, ErrorCode, ExecCmdRequest, MAX_CHUNK_SIZE, Packet, PacketType,
    ReadRegsRequest, ReadStrRegRequest, ReadStrRegResponse, ReadVmemRequest, RegInfoRequest,
    RegInfoResponse, RegValue, RequestContent, ResponseContent, S3pInfoRequest, S3pInfoResponse,
    Value, VmemInfoRequest, VmemInfoResponse, WriteRegRequest, WriteStrRegRequest,
    WriteVmemRequest, is_valid_node_id, make_frame, parse_frame,
};
use s3p_transport::{CancelToken, Transport, read_frame};

use crate::cache::{RegTable, VmemTable};
use crate::config::ClientConfig;
use crate::error::Error;

/// Progress hook for bulk transfers and walks: called with the
/// cumulative number of bytes (or entries) handled so far.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64);

/// An S3P manager speaking to one node over an owned transport.
pub struct Client {
    transport: Box<dyn Transport>,
    config: ClientConfig,
    cancel: CancelToken,
    seq: u8,
    regs: Option<RegTable>,
    vmem: Option<VmemTable>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("seq", &self.seq)
            .field("regs", &self.regs)
            .field("vmem", &self.vmem)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client over `transport`. Fails on reserved node ids.
    pub fn new(transport: Box<dyn Transport>, config: ClientConfig) -> crate::Result<Client> {
        config.validate()?;
        Ok(Client {
            transport,
            config,
            cancel: CancelToken::new(),
            seq: 0,
            regs: None,
            vmem: None,
        })
    }

    /// The cancellation token observed at every suspension point.
    /// Clone it into a Ctrl-C handler; remember to
    /// [`reset`][CancelToken::reset] it before the next operation.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Retargets the client at a different node. Drops the cached
    /// metadata tables, which belong to the previous node.
    pub fn set_node_id(&mut self, node_id: u8) -> crate::Result<()> {
        if !is_valid_node_id(node_id) {
            return Err(Error::ReservedNodeId { id: node_id });
        }
        if node_id != self.config.node_id {
            self.config.node_id = node_id;
            self.regs = None;
            self.vmem = None;
        }
        Ok(())
    }

    fn next_seq(&mut self) -> u8 {
        self.seq = (self.seq + 1) & 0x0F;
        self.seq
    }

    /// Runs one request/response exchange and returns the node status
    /// code plus the payload bytes that follow it.
    fn transact(&mut self, request: &RequestContent) -> crate::Result<(ErrorCode, Vec<u8>)> {
        // Pre-request hygiene: drop whatever lingers in the inbound
        // buffer so the next delimiter-terminated run is our response.
        self.transport.discard()?;

        let seq = self.next_seq();
        let ptype = request.packet_type();

        let mut cursor = Cursor::new(Vec::new());
        request
            .write_be_args(&mut cursor, (&ptype,))
            .map_err(s3p_msg::S3pMsgError::Codec)?;
        let pkt = Packet::new(
            self.config.manager_id,
            self.config.node_id,
            seq,
            ptype,
            cursor.into_inner(),
        );
        let frame = make_frame(&pkt)?;

        log::debug!(
            "msg out: src={:#04x} dst={:#04x} seq={seq:#03x} type={ptype} data_len={}",
            pkt.src_id,
            pkt.dst_id,
            pkt.data.len(),
        );
        self.transport.write(&frame)?;

        let raw = read_frame(
            self.transport.as_mut(),
            self.config.response_timeout,
            self.config.poll_interval,
            &self.cancel,
        )?;
        let resp = parse_frame(&raw, self.config.manager_id)?;
        log::debug!(
            "msg in: src={:#04x} seq={:#03x} type={} data_len={}",
            resp.src_id,
            resp.seq(),
            resp.ptype,
            resp.data.len(),
        );

        if resp.seq() != seq {
            log::warn!(
                "response sequence mismatch: sent {seq:#03x}, received {:#03x}",
                resp.seq()
            );
            return Err(Error::SeqMismatch {
                sent: seq,
                received: resp.seq(),
            });
        }

        let expected = request.response_packet_type();
        if resp.ptype != expected {
            log::warn!("unexpected response type {} (expected {expected})", resp.ptype);
            return Err(Error::UnexpectedResponseType {
                expected,
                received: resp.ptype,
            });
        }

        let Some((&code, payload)) = resp.data.split_first() else {
            return Err(Error::EmptyResponse);
        };
        Ok((ErrorCode(code), payload.to_vec()))
    }

    /// [`transact`][Self::transact], failing on a non-zero status code.
    fn transact_ok(&mut self, request: &RequestContent) -> crate::Result<Vec<u8>> {
        let (code, payload) = self.transact(request)?;
        if !code.is_ok() {
            log::debug!("node reported {code}");
            return Err(Error::Node(code));
        }
        Ok(payload)
    }

    /// Parses the payload after the status code as typed content.
    fn parse_content(resp_type: PacketType, payload: &[u8]) -> crate::Result<ResponseContent> {
        let mut cursor = Cursor::new(payload);
        let content = ResponseContent::read_be_args(&mut cursor, (&resp_type,))
            .map_err(s3p_msg::S3pMsgError::Codec)?;
        Ok(content)
    }

    // --- Commands ---

    /// Pings the node, returning the round-trip time.
    pub fn ping(&mut self) -> crate::Result<Duration> {
        let request = RequestContent::from(ExecCmdRequest {
            cmd_id: CMD_PING,
            arg: 0,
        });
        let started = Instant::now();
        self.transact_ok(&request)?;
        Ok(started.elapsed())
    }

    /// Asks the node to reboot. The node acknowledges first; expect no
    /// further traffic until it comes back.
    pub fn reboot(&mut self) -> crate::Result<()> {
        let request = RequestContent::from(ExecCmdRequest {
            cmd_id: CMD_REBOOT,
            arg: 0,
        });
        self.transact_ok(&request)?;
        Ok(())
    }

    /// Executes an arbitrary command. The returned bytes are whatever
    /// the command defines after the status code.
    pub fn exec_cmd(&mut self, cmd_id: u8, arg: u32) -> crate::Result<Vec<u8>> {
        let request = RequestContent::from(ExecCmdRequest { cmd_id, arg });
        self.transact_ok(&request)
    }

    // --- Registers ---

    /// Reads up to `count` scalar registers starting at `first_id`.
    /// The node may return fewer records than requested.
    pub fn read_regs(&mut self, first_id: u16, count: u16) -> crate::Result<Vec<RegValue>> {
        let request = RequestContent::from(ReadRegsRequest { first_id, count });
        let payload = self.transact_ok(&request)?;
        let content = Self::parse_content(PacketType::ReadRegsResp, &payload)?;
        Ok(content.to_read_regs()?.values)
    }

    /// Writes one scalar register.
    pub fn write_reg(&mut self, reg_id: u16, value: Value) -> crate::Result<()> {
        if !value.is_scalar() {
            return Err(Error::Msg(s3p_msg::S3pMsgError::NotScalar));
        }
        let request = RequestContent::from(WriteRegRequest { reg_id, value });
        self.transact_ok(&request)?;
        Ok(())
    }

    /// Reads a string register.
    pub fn read_str_reg(&mut self, reg_id: u16) -> crate::Result<ReadStrRegResponse> {
        let request = RequestContent::from(ReadStrRegRequest { reg_id });
        let payload = self.transact_ok(&request)?;
        let content = Self::parse_content(PacketType::ReadStrRegResp, &payload)?;
        content.to_read_str_reg().map_err(Error::Msg)
    }

    /// Writes a string register. The NUL terminator is appended on the
    /// wire.
    pub fn write_str_reg(&mut self, reg_id: u16, value: &str) -> crate::Result<()> {
        let request = RequestContent::from(WriteStrRegRequest::new(reg_id, value)?);
        self.transact_ok(&request)?;
        Ok(())
    }

    // --- VMEM ---

    /// Reads one chunk of at most [`MAX_CHUNK_SIZE`] bytes from the
    /// virtual address `addr`.
    pub fn read_vmem(&mut self, addr: u32, size: u16) -> crate::Result<Vec<u8>> {
        if size as usize > MAX_CHUNK_SIZE {
            return Err(Error::ChunkTooLarge { len: size as usize });
        }
        let request = RequestContent::from(ReadVmemRequest { addr, size });
        self.transact_ok(&request)
    }

    /// Writes one chunk of at most [`MAX_CHUNK_SIZE`] bytes at the
    /// virtual address `addr`.
    pub fn write_vmem(&mut self, addr: u32, data: &[u8]) -> crate::Result<()> {
        if data.len() > MAX_CHUNK_SIZE {
            return Err(Error::ChunkTooLarge { len: data.len() });
        }
        let request = RequestContent::from(WriteVmemRequest {
            addr,
            data: data.to_vec(),
        });
        self.transact_ok(&request)?;
        Ok(())
    }

    /// Downloads `tot_size` bytes starting at `addr` into `sink`,
    /// chunk by chunk.
    ///
    /// Returns the number of bytes written to the sink: the full size
    /// on success, a strict prefix if cancelled between chunks. Node
    /// errors and link failures abort with an error; there is no
    /// automatic retry, and the sink keeps whatever arrived before the
    /// failure.
    pub fn download(
        &mut self,
        addr: u32,
        tot_size: u32,
        sink: &mut dyn Write,
        mut progress: Option<ProgressFn<'_>>,
    ) -> crate::Result<u64> {
        let total = u64::from(tot_size);
        let mut addr = addr;
        let mut received = 0u64;

        log::debug!("download: {total} bytes from {addr:#010x}");
        while received < total {
            if self.cancel.is_cancelled() {
                log::info!("download cancelled at {received} of {total} bytes");
                break;
            }

            let chunk = MAX_CHUNK_SIZE.min((total - received) as usize) as u16;
            let request = RequestContent::from(ReadVmemRequest { addr, size: chunk });
            let payload = match self.transact_ok(&request) {
                Ok(payload) => payload,
                Err(Error::Cancelled) => break,
                Err(err) => return Err(err),
            };

            // The node may serve less than a full chunk, never more.
            let got = payload.len().min(chunk as usize);
            if got == 0 {
                return Err(Error::EmptyResponse);
            }
            sink.write_all(&payload[..got])?;
            received += got as u64;
            addr += got as u32;
            log::trace!("chunk ok: +{got} -> {received}/{total}");
            if let Some(callback) = progress.as_mut() {
                callback(received);
            }
        }

        Ok(received)
    }

    /// Uploads bytes from `source` starting at `addr`, chunk by chunk,
    /// until the source is exhausted.
    ///
    /// Returns the number of bytes sent; see [`download`][Self::download]
    /// for the abort semantics.
    pub fn upload(
        &mut self,
        addr: u32,
        source: &mut dyn Read,
        mut progress: Option<ProgressFn<'_>>,
    ) -> crate::Result<u64> {
        let mut addr = addr;
        let mut sent = 0u64;
        let mut chunk = [0u8; MAX_CHUNK_SIZE];

        log::debug!("upload: to {addr:#010x}");
        loop {
            if self.cancel.is_cancelled() {
                log::info!("upload cancelled at {sent} bytes");
                break;
            }

            let n = read_full(source, &mut chunk)?;
            if n == 0 {
                break;
            }

            let request = RequestContent::from(WriteVmemRequest {
                addr,
                data: chunk[..n].to_vec(),
            });
            match self.transact_ok(&request) {
                Ok(_) => {}
                Err(Error::Cancelled) => break,
                Err(err) => return Err(err),
            }

            sent += n as u64;
            addr += n as u32;
            log::trace!("chunk ok: +{n} -> {sent}");
            if let Some(callback) = progress.as_mut() {
                callback(sent);
            }
        }

        Ok(sent)
    }

    // --- Metadata ---

    /// Fetches the node's version and table summary.
    pub fn info(&mut self) -> crate::Result<S3pInfoResponse> {
        let request = RequestContent::from(S3pInfoRequest::default());
        let payload = self.transact_ok(&request)?;
        let content = Self::parse_content(PacketType::S3pInfoResp, &payload)?;
        content.to_s3p_info().map_err(Error::Msg)
    }

    /// Fetches one register descriptor.
    pub fn reg_info(&mut self, reg_id: u16) -> crate::Result<RegInfoResponse> {
        let request = RequestContent::from(RegInfoRequest { reg_id });
        let payload = self.transact_ok(&request)?;
        let content = Self::parse_content(PacketType::RegInfoResp, &payload)?;
        content.to_reg_info().map_err(Error::Msg)
    }

    /// Fetches one VMEM mapping descriptor.
    pub fn vmem_info(&mut self, row_idx: u8) -> crate::Result<VmemInfoResponse> {
        let request = RequestContent::from(VmemInfoRequest { row_idx });
        let payload = self.transact_ok(&request)?;
        let content = Self::parse_content(PacketType::VmemInfoResp, &payload)?;
        content.to_vmem_info().map_err(Error::Msg)
    }

    /// The cached register table, downloading it on first use.
    pub fn reg_table(&mut self) -> crate::Result<&RegTable> {
        if self.regs.is_none() {
            self.refresh_reg_table()?;
        }
        match &self.regs {
            Some(table) => Ok(table),
            None => Err(Error::InvalidMetadata {
                reason: "register table unavailable",
            }),
        }
    }

    /// Downloads the register table, replacing any cached copy.
    ///
    /// The walk starts at the advertised minimum id and follows each
    /// descriptor's `next_id` until the chain ends or a cap is hit. A
    /// failure or cancellation mid-walk keeps the rows collected so
    /// far and marks the table incomplete.
    pub fn refresh_reg_table(&mut self) -> crate::Result<&RegTable> {
        let info = self.info()?;
        if info.reg_min_id == 0 || info.regs_cnt == 0 {
            return Err(Error::InvalidMetadata {
                reason: "node advertises no registers",
            });
        }

        log::debug!("downloading regs table: {} entries", info.regs_cnt);
        let mut entries = Vec::with_capacity(usize::from(info.regs_cnt));
        let mut reg_id = info.reg_min_id;
        while entries.len() < usize::from(info.regs_cnt) && reg_id <= info.reg_max_id {
            if self.cancel.is_cancelled() {
                log::info!("regs walk cancelled after {} entries", entries.len());
                break;
            }
            let descriptor = match self.reg_info(reg_id) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    log::warn!("regs walk stopped at id {reg_id}: {err}");
                    break;
                }
            };
            let next_id = descriptor.next_id;
            entries.push(descriptor.into());
            log::trace!("got {} of {}", entries.len(), info.regs_cnt);
            if next_id == 0 {
                break;
            }
            reg_id = next_id;
        }

        let complete = entries.len() == usize::from(info.regs_cnt);
        if !complete {
            log::warn!(
                "regs table incomplete: {} of {}",
                entries.len(),
                info.regs_cnt
            );
        }
        self.regs = Some(RegTable::new(entries, complete));
        self.reg_table()
    }

    /// The cached VMEM table, downloading it on first use.
    pub fn vmem_table(&mut self) -> crate::Result<&VmemTable> {
        if self.vmem.is_none() {
            self.refresh_vmem_table()?;
        }
        match &self.vmem {
            Some(table) => Ok(table),
            None => Err(Error::InvalidMetadata {
                reason: "VMEM table unavailable",
            }),
        }
    }

    /// Downloads the VMEM mapping table, replacing any cached copy.
    /// Walks `next_idx` from row 0, same partial semantics as
    /// [`refresh_reg_table`][Self::refresh_reg_table].
    pub fn refresh_vmem_table(&mut self) -> crate::Result<&VmemTable> {
        let info = self.info()?;
        if info.vmem_rows == 0 {
            return Err(Error::InvalidMetadata {
                reason: "node does not support VMEM",
            });
        }

        log::debug!("downloading VMEM table: {} rows", info.vmem_rows);
        let mut entries = Vec::with_capacity(usize::from(info.vmem_rows));
        let mut row_idx = 0u8;
        while entries.len() < usize::from(info.vmem_rows) && row_idx < info.vmem_rows {
            if self.cancel.is_cancelled() {
                log::info!("VMEM walk cancelled after {} rows", entries.len());
                break;
            }
            let descriptor = match self.vmem_info(row_idx) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    log::warn!("VMEM walk stopped at row {row_idx}: {err}");
                    break;
                }
            };
            let next_idx = descriptor.next_idx;
            entries.push(descriptor.into());
            log::trace!("got {} of {}", entries.len(), info.vmem_rows);
            if next_idx == 0 {
                break;
            }
            row_idx = next_idx;
        }

        let complete = entries.len() == usize::from(info.vmem_rows);
        if !complete {
            log::warn!(
                "VMEM table incomplete: {} of {}",
                entries.len(),
                info.vmem_rows
            );
        }
        self.vmem = Some(VmemTable::new(entries, complete));
        self.vmem_table()
    }
}

/// Reads from `source` until `buf` is full or the source ends.
/// A plain `read` may return short counts well before EOF.
fn read_full(source: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
