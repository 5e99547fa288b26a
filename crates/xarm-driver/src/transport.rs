//! TCP 传输层
//!
//! 持有一条长连接，保证任意时刻线上最多一个未完成请求：
//! 协议严格半双工（完整的请求→响应往返后才能发下一个请求），
//! 并发调用方阻塞在序列化锁上而不是在线上竞争帧。
//!
//! 连接是锁内持有的可替换句柄：重连在同一把锁内按需拨号完成，
//! 并发调用方不可能观察到"半重连"状态。任何 I/O 失败或超时都会
//! 使连接失效（关闭并置空），失败的调用本身返回错误——单次调用内
//! 不做任何隐式重试，下一次调用透明重连。

use crate::error::XArmError;
use parking_lot::Mutex;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, trace};
use xarm_protocol::{CommandFrame, HEADER_LEN, ProtocolError, ResponseFrame, ResponseHeader};

/// 单次线上往返的固定期限
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(5);

/// TCP 传输
#[derive(Debug)]
pub(crate) struct Transport {
    addr: String,
    conn: Mutex<Option<TcpStream>>,
    closed: AtomicBool,
}

impl Transport {
    pub fn new(addr: String) -> Self {
        Self {
            addr,
            conn: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// 驱动是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 当前是否持有活跃连接
    pub fn has_connection(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// 标记关闭并丢弃连接；之后的任何调用快速失败
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let mut guard = self.conn.lock();
        if let Some(conn) = guard.take() {
            let _ = conn.shutdown(std::net::Shutdown::Both);
        }
    }

    /// 发送一帧并读取完整响应（一个请求-响应往返）
    pub fn exchange(&self, frame: &CommandFrame) -> Result<ResponseFrame, XArmError> {
        if self.is_closed() {
            return Err(XArmError::Closed);
        }

        let mut guard = self.conn.lock();

        // 拨号必须在锁内完成
        if guard.is_none() {
            let conn = self.dial()?;
            debug!(addr = %self.addr, "connected");
            *guard = Some(conn);
        }

        let conn = match guard.as_mut() {
            Some(conn) => conn,
            None => return Err(XArmError::Closed),
        };

        match Self::exchange_on(conn, frame) {
            Ok(resp) => Ok(resp),
            Err(err) => {
                // 连接失效：关闭并置空，下一次调用透明重连
                if let Some(conn) = guard.take() {
                    let _ = conn.shutdown(std::net::Shutdown::Both);
                }
                debug!(error = %err, "connection invalidated");
                Err(err)
            }
        }
    }

    fn dial(&self) -> Result<TcpStream, XArmError> {
        let conn = TcpStream::connect(&self.addr)?;
        conn.set_nodelay(true)?;
        conn.set_read_timeout(Some(REQUEST_DEADLINE))?;
        conn.set_write_timeout(Some(REQUEST_DEADLINE))?;
        Ok(conn)
    }

    fn exchange_on(conn: &mut TcpStream, frame: &CommandFrame) -> Result<ResponseFrame, XArmError> {
        let encoded = frame.encode();
        trace!(tx = %hex::encode(&encoded), "frame out");
        conn.write_all(&encoded)?;

        let mut header_buf = [0u8; HEADER_LEN];
        let got = read_full(conn, &mut header_buf)?;
        if got < HEADER_LEN {
            return Err(ProtocolError::ShortHeader { actual: got }.into());
        }
        let header = ResponseHeader::decode(&header_buf)?;

        let mut params = vec![0u8; header.param_len];
        let got = read_full(conn, &mut params)?;
        if got < header.param_len {
            // 声明长度比实际到达的字节多：连接被对端关闭或截断
            return Err(ProtocolError::ShortParams {
                declared: header.param_len,
                actual: got,
            }
            .into());
        }
        trace!(rx = %hex::encode(&params), reg = header.reg, "frame in");

        Ok(ResponseFrame::assemble(header, params)?)
    }
}

/// 读满缓冲区；对端正常关闭（EOF）时返回已读字节数，
/// 读超时和其他 I/O 错误原样上抛
fn read_full(conn: &mut TcpStream, buf: &mut [u8]) -> Result<usize, XArmError> {
    let mut total = 0;
    while total < buf.len() {
        match conn.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}
