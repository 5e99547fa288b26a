//! # xArm Protocol
//!
//! UFACTORY xArm 控制盒 TCP 协议定义（无 I/O 依赖）
//!
//! ## 模块
//!
//! - `registers`: 寄存器操作码常量定义
//! - `constants`: 协议常量定义（运动模式、运动状态、状态位）
//! - `control`: 控制帧 payload 构建
//! - `errors`: 设备错误/警告/伺服错误码表与分类
//!
//! ## 字节序
//!
//! 帧头使用高位在前（大端字节序）；关节角 payload 为 IEEE-754
//! 单精度小端字节序，每关节 4 字节，固定补齐到 7 个关节。

pub mod constants;
pub mod control;
pub mod errors;
pub mod registers;

// 重新导出常用类型
pub use constants::*;
pub use control::*;
pub use errors::*;
pub use registers::*;

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 响应头不足 7 字节
    #[error("short response header: expected 7 bytes, got {actual}")]
    ShortHeader { actual: usize },

    /// 响应声明的 params 长度与实际可用字节不符
    #[error("short response params: declared {declared}, got {actual}")]
    ShortParams { declared: usize, actual: usize },

    /// 响应声明的 payload 长度为 0（length 至少包含 register 一个字节）
    #[error("invalid payload length 0 in response header")]
    EmptyPayload,

    /// params 长度与期望不符（语义层校验）
    #[error("unexpected params length for {what}: expected {expected}, got {actual}")]
    UnexpectedParams {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// 响应帧头长度：`[tid:u16][proto:u16][length:u16][register:u8]`
pub const HEADER_LEN: usize = 7;

/// 请求命令帧
///
/// 线上布局（大端帧头）：
///
/// ```text
/// [tid:u16][protocol:u16=2][length:u16 = 1 + params.len()][register:u8][params...]
/// ```
///
/// `length` 字段由编码器计算，调用方永远不直接提供。
/// `tid` 由驱动实例单调递增分配，允许回绕——它只用于协议分帧，
/// 不用于应用层的请求关联。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandFrame {
    /// 事务 ID（协议分帧用）
    pub tid: u16,
    /// 协议 ID（固定为 [`PROTOCOL_ID`]）
    pub proto: u16,
    /// 寄存器操作码
    pub reg: u8,
    /// 参数字节
    pub params: Vec<u8>,
}

impl CommandFrame {
    /// 创建指定寄存器的命令帧（无参数）
    pub fn new(tid: u16, reg: registers::Register) -> Self {
        Self {
            tid,
            proto: PROTOCOL_ID,
            reg: reg.into(),
            params: Vec::new(),
        }
    }

    /// 创建带参数的命令帧
    pub fn with_params(tid: u16, reg: registers::Register, params: Vec<u8>) -> Self {
        Self {
            tid,
            proto: PROTOCOL_ID,
            reg: reg.into(),
            params,
        }
    }

    /// 编码为线上字节序列
    ///
    /// 编码是全函数（永不失败）；`length` 字段在此计算。
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.params.len());
        buf.put_u16(self.tid);
        buf.put_u16(self.proto);
        buf.put_u16(1 + self.params.len() as u16);
        buf.put_u8(self.reg);
        buf.put_slice(&self.params);
        buf.to_vec()
    }
}

/// 响应帧头（已解析）
///
/// 先于 params 单独解析，便于传输层按 `param_len` 精确读取剩余字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub tid: u16,
    pub proto: u16,
    /// 寄存器操作码（成功时回显请求的 register）
    pub reg: u8,
    /// 随后需要读取的 params 字节数（`length - 1`）
    pub param_len: usize,
}

impl ResponseHeader {
    /// 从 7 字节帧头解析
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < HEADER_LEN {
            return Err(ProtocolError::ShortHeader { actual: buf.len() });
        }
        let mut buf = &buf[..HEADER_LEN];
        let tid = buf.get_u16();
        let proto = buf.get_u16();
        let length = buf.get_u16();
        let reg = buf.get_u8();
        if length == 0 {
            return Err(ProtocolError::EmptyPayload);
        }
        Ok(Self {
            tid,
            proto,
            reg,
            param_len: usize::from(length) - 1,
        })
    }
}

/// 响应帧
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseFrame {
    pub tid: u16,
    pub proto: u16,
    pub reg: u8,
    pub params: Vec<u8>,
}

impl ResponseFrame {
    /// 从帧头和已读取的 params 组装响应
    pub fn assemble(header: ResponseHeader, params: Vec<u8>) -> Result<Self, ProtocolError> {
        if params.len() != header.param_len {
            return Err(ProtocolError::ShortParams {
                declared: header.param_len,
                actual: params.len(),
            });
        }
        Ok(Self {
            tid: header.tid,
            proto: header.proto,
            reg: header.reg,
            params,
        })
    }

    /// 从完整缓冲区解码（测试与离线分析用；传输层走
    /// [`ResponseHeader::decode`] + [`ResponseFrame::assemble`] 两段式）
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        let header = ResponseHeader::decode(buf)?;
        let rest = &buf[HEADER_LEN..];
        if rest.len() < header.param_len {
            return Err(ProtocolError::ShortParams {
                declared: header.param_len,
                actual: rest.len(),
            });
        }
        Ok(Self {
            tid: header.tid,
            proto: header.proto,
            reg: header.reg,
            params: rest[..header.param_len].to_vec(),
        })
    }

    /// 响应首字节为设备状态字节
    pub fn state_byte(&self) -> Option<u8> {
        self.params.first().copied()
    }
}

/// 小端字节序解码 f32（关节角 payload 用）
pub fn f32_from_bytes_le(bytes: [u8; 4]) -> f32 {
    f32::from_le_bytes(bytes)
}

/// f32 编码为小端字节序（关节角 payload 用）
pub fn f32_to_bytes_le(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}
