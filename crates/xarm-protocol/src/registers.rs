//! 寄存器操作码定义
//!
//! 控制盒命令寄存器。每条命令帧携带一个寄存器操作码，
//! 成功的响应会回显请求的寄存器。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 命令寄存器操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    /// 固件版本查询
    Version = 0x01,
    /// 伺服使能/去使能
    ToggleServo = 0x0B,
    /// 设置运动状态
    SetState = 0x0C,
    /// 查询运动状态
    GetState = 0x0D,
    /// 查询错误/警告码
    GetError = 0x0F,
    /// 清除错误
    ClearError = 0x10,
    /// 清除警告
    ClearWarn = 0x11,
    /// 抱闸使能/去使能
    ToggleBrake = 0x12,
    /// 设置运动模式
    SetMode = 0x13,
    /// 关节回零
    ZeroJoints = 0x19,
    /// 伺服流式关节运动（servo-mode streaming）
    MoveJoints = 0x1D,
    /// 碰撞灵敏度设置
    Sensitivity = 0x25,
    /// 查询当前关节角
    JointPos = 0x2A,
    /// 查询关节电流/力矩
    CurrentTorque = 0x37,
    /// 设置末端执行器型号
    SetEndEffectorModel = 0x4E,
    /// 逐伺服错误码查询
    ServoError = 0x6A,
    /// 夹爪控制（经主机/设备前导子寻址）
    GripperControl = 0x7C,
    /// 真空吸盘控制（tool modbus 通道）
    VacuumControl = 0x7F,
    /// 真空吸盘状态查询
    VacuumState = 0x80,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_values() {
        assert_eq!(u8::from(Register::Version), 0x01);
        assert_eq!(u8::from(Register::MoveJoints), 0x1D);
        assert_eq!(u8::from(Register::JointPos), 0x2A);
        assert_eq!(u8::from(Register::GripperControl), 0x7C);
        assert_eq!(u8::from(Register::VacuumState), 0x80);
    }

    #[test]
    fn test_register_from_primitive() {
        assert_eq!(Register::try_from(0x0F).unwrap(), Register::GetError);
        assert!(Register::try_from(0xEE).is_err());
    }
}
