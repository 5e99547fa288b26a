//! 控制帧 payload 构建与响应 payload 解析
//!
//! 纯字节层：这里只负责 params 的构建/解析，tid 分配与发送由驱动层完成。

use crate::ProtocolError;

/// 线上协议固定的关节数：无论实际自由度是 6 还是 7，
/// 关节 payload 都补齐到 7 个关节
pub const WIRE_DOF: usize = 7;

/// 主机 ID（夹爪/真空吸盘子寻址前导）
pub const HOST_ID: u8 = 0x09;

/// 夹爪设备 ID
pub const GRIPPER_ID: u8 = 0x08;

/// 真空吸盘设备 ID
pub const VACUUM_ID: u8 = 0x0A;

// ============================================================================
// 关节运动
// ============================================================================

/// 构建伺服流式运动（MoveJoints）的 params
///
/// 每关节 IEEE-754 f32 小端 4 字节，不足 7 关节补零；
/// 末尾追加 3 个全零 u32（servoj 模式下运动时间/速度/加速度
/// 不由控制盒处理）。
pub fn servo_move_params(joints: &[f64]) -> Vec<u8> {
    let mut params = Vec::with_capacity(WIRE_DOF * 4 + 12);
    for &rad in joints {
        params.extend_from_slice(&(rad as f32).to_le_bytes());
    }
    for _ in joints.len()..WIRE_DOF {
        params.extend_from_slice(&[0, 0, 0, 0]);
    }
    params.extend_from_slice(&[0; 12]);
    params
}

/// 伺服/抱闸开关的 params：`[8, enable]`
pub fn toggle_params(enable: bool) -> Vec<u8> {
    vec![8, u8::from(enable)]
}

/// 解析关节角查询响应
///
/// params 布局：`[state][j1:f32le][j2:f32le]...`，至少 `dof` 个关节。
pub fn parse_joint_positions(params: &[u8], dof: usize) -> Result<Vec<f64>, ProtocolError> {
    if params.len() < dof * 4 + 1 {
        return Err(ProtocolError::UnexpectedParams {
            what: "joint positions",
            expected: dof * 4 + 1,
            actual: params.len(),
        });
    }
    let mut radians = Vec::with_capacity(dof);
    for i in 0..dof {
        let idx = i * 4 + 1;
        let bytes = [params[idx], params[idx + 1], params[idx + 2], params[idx + 3]];
        radians.push(f64::from(f32::from_le_bytes(bytes)));
    }
    Ok(radians)
}

/// 解析关节电流/力矩查询响应（与关节角响应同构）
pub fn parse_joint_loads(params: &[u8], dof: usize) -> Result<Vec<f64>, ProtocolError> {
    parse_joint_positions(params, dof)
}

// ============================================================================
// 夹爪（register 0x7C，主机/设备前导子寻址）
// ============================================================================

/// 夹爪命令前导：`[host][gripper][0x10 写 / 0x03 读]`
pub fn gripper_preamble(write: bool) -> Vec<u8> {
    vec![HOST_ID, GRIPPER_ID, if write { 0x10 } else { 0x03 }]
}

/// 夹爪使能 params
pub fn gripper_enable_params() -> Vec<u8> {
    let mut params = gripper_preamble(true);
    params.extend_from_slice(&[0x01, 0x00]);
    params.extend_from_slice(&[0x00, 0x01]);
    params.push(0x02);
    params.extend_from_slice(&[0x00, 0x01]);
    params
}

/// 夹爪模式 params（`speed` 为速度模式，否则位置模式）
pub fn gripper_mode_params(speed: bool) -> Vec<u8> {
    let mut params = gripper_preamble(true);
    params.extend_from_slice(&[0x01, 0x01]);
    params.extend_from_slice(&[0x00, 0x01]);
    params.push(0x02);
    if speed {
        params.extend_from_slice(&[0x00, 0x01]);
    } else {
        params.extend_from_slice(&[0x00, 0x00]);
    }
    params
}

/// 夹爪目标位置 params（位置为大端 u32）
pub fn gripper_set_position_params(position: u32) -> Vec<u8> {
    let mut params = gripper_preamble(true);
    params.extend_from_slice(&[0x07, 0x00]);
    params.extend_from_slice(&[0x00, 0x02]);
    params.push(0x04);
    params.extend_from_slice(&position.to_be_bytes());
    params
}

/// 夹爪位置查询 params
pub fn gripper_get_position_params() -> Vec<u8> {
    let mut params = gripper_preamble(false);
    params.extend_from_slice(&[0x07, 0x02]);
    params.extend_from_slice(&[0x00, 0x02]);
    params
}

/// 解析夹爪位置查询响应
///
/// 实测布局（9 字节）：
/// ```text
/// open  : 0 9 8 3 4 0 0 3 73
/// closed: 0 9 8 3 4 0 0 0 0
/// ```
/// 位置为末 4 字节的大端 u32。
pub fn parse_gripper_position(params: &[u8]) -> Result<u32, ProtocolError> {
    if params.len() != 9 {
        return Err(ProtocolError::UnexpectedParams {
            what: "gripper position",
            expected: 9,
            actual: params.len(),
        });
    }
    Ok(u32::from_be_bytes([params[5], params[6], params[7], params[8]]))
}

// ============================================================================
// 真空吸盘 / tool-GPIO 通道（register 0x7F / 0x80）
// ============================================================================

/// 真空吸盘/工具通道命令前导：`[host][vacuum][0x15]`
pub fn vacuum_preamble() -> Vec<u8> {
    vec![HOST_ID, VACUUM_ID, 0x15]
}

/// 工具通道 0 写入 params（on: 0x80，off: 0x00）
pub fn tool_channel0_params(on: bool) -> Vec<u8> {
    let mut params = vacuum_preamble();
    params.extend_from_slice(&[0x00, if on { 0x80 } else { 0x00 }, 0x80, 0x43]);
    params
}

/// 工具通道 1 写入 params
pub fn tool_channel1_params(on: bool) -> Vec<u8> {
    let mut params = vacuum_preamble();
    params.extend_from_slice(&[0x00, if on { 0x80 } else { 0x00 }, 0x00, 0x44]);
    params
}

/// 真空吸盘状态查询 params
pub fn vacuum_state_params() -> Vec<u8> {
    vec![HOST_ID, VACUUM_ID, 0x14]
}

/// 解析真空吸盘状态响应（5 字节，末字节 0x01 表示吸合）
pub fn parse_vacuum_state(params: &[u8]) -> Result<bool, ProtocolError> {
    if params.len() != 5 {
        return Err(ProtocolError::UnexpectedParams {
            what: "vacuum state",
            expected: 5,
            actual: params.len(),
        });
    }
    Ok(params[4] == 0x01)
}
