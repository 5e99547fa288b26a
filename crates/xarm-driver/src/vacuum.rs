//! 真空吸盘与 Lite6 夹爪控制器
//!
//! 两者共用 tool-GPIO 双通道线路（register 0x7F 写、0x80 查询）。
//! 真空吸盘是纯 fire-and-forget 的双通道命令对，没有轮询反馈环。

use crate::error::XArmError;
use crate::xarm::XArm;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use xarm_protocol::{
    parse_vacuum_state, tool_channel0_params, tool_channel1_params, vacuum_state_params, Register,
};

impl XArm {
    /// 写工具双通道（每通道一帧，两帧都经错误检查发送）
    pub(crate) fn set_tool_channels(&self, ch0: bool, ch1: bool) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::VacuumControl, tool_channel0_params(ch0));
        self.send(frame, true)?;
        let frame = self.new_cmd_with(Register::VacuumControl, tool_channel1_params(ch1));
        self.send(frame, true)?;
        Ok(())
    }

    /// 查询工具通道状态（真空吸合 / lite 夹爪闭合）
    pub(crate) fn tool_channel_state(&self) -> Result<bool, XArmError> {
        let frame = self.new_cmd_with(Register::VacuumState, vacuum_state_params());
        let resp = self.send(frame, true)?;
        Ok(parse_vacuum_state(&resp.params)?)
    }
}

/// 真空吸盘控制器
pub struct Vacuum {
    arm: Arc<XArm>,
    moving: AtomicBool,
}

impl Vacuum {
    pub fn new(arm: Arc<XArm>) -> Self {
        Self {
            arm,
            moving: AtomicBool::new(false),
        }
    }

    /// 开始吸取（设备语义上是"打开"通道 0、关闭通道 1）
    pub fn grab(&self) -> Result<(), XArmError> {
        self.moving.store(true, Ordering::SeqCst);
        let result = self.arm.set_tool_channels(true, false);
        self.moving.store(false, Ordering::SeqCst);
        result
    }

    /// 停止吸取
    pub fn open(&self) -> Result<(), XArmError> {
        self.moving.store(true, Ordering::SeqCst);
        let result = self.arm.set_tool_channels(false, true);
        self.moving.store(false, Ordering::SeqCst);
        result
    }

    /// 当前是否处于吸合状态
    pub fn state(&self) -> Result<bool, XArmError> {
        self.arm.tool_channel_state()
    }

    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::SeqCst)
    }
}

/// Lite6 夹爪控制器
///
/// Lite6 末端夹爪走与真空吸盘相同的工具通道线路，
/// 只有开/合/停三个动作，没有位置反馈环。
pub struct GripperLite {
    arm: Arc<XArm>,
}

impl GripperLite {
    pub fn new(arm: Arc<XArm>) -> Self {
        Self { arm }
    }

    /// 张开
    pub fn open(&self) -> Result<(), XArmError> {
        self.arm.set_tool_channels(true, false)
    }

    /// 闭合
    pub fn close(&self) -> Result<(), XArmError> {
        self.arm.set_tool_channels(false, true)
    }

    /// 停止当前动作
    pub fn stop(&self) -> Result<(), XArmError> {
        self.arm.set_tool_channels(false, false)
    }

    /// 是否处于闭合状态
    pub fn is_closed(&self) -> Result<bool, XArmError> {
        self.arm.tool_channel_state()
    }
}
