//! 夹爪控制器
//!
//! 薄命令 + 轮询状态机：下发"移动到位置"命令后，以固定短间隔
//! 轮询当前位置，直到 (a) 位置进入目标容差，(b) 相邻两次轮询
//! 变化可忽略（堵转——夹爪在到达名义目标前碰到机械限位），
//! 或 (c) 固定超时到期（报超时错误，附带耗时）。
//!
//! 收敛判定表达为显式状态机 + 策略对象，与调度原语无关：
//! 阻塞 sleep 或定时器/future 都能驱动同一个
//! [`ConvergenceTracker`]。

use crate::error::XArmError;
use crate::xarm::XArm;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use xarm_protocol::{
    gripper_enable_params, gripper_get_position_params, gripper_mode_params,
    gripper_set_position_params, parse_gripper_position, Register,
};

/// 夹爪"抓取"目标位置（接近全闭）
pub const GRAB_POSITION: i64 = 2;

/// 夹爪"张开"目标位置
pub const OPEN_POSITION: i64 = 840;

/// 收敛判定策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergencePolicy {
    /// 目标容差：|pos − goal| 不超过它即算到位
    pub tolerance: i64,
    /// 堵转阈值：相邻两次轮询位置变化不超过它即算堵转
    pub stall_threshold: i64,
    /// 收敛总超时
    pub timeout: Duration,
    /// 轮询间隔
    pub poll_interval: Duration,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            tolerance: 6,
            stall_threshold: 3,
            timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// 单次观察的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// 到达目标容差内，携带最后观察到的位置
    Converged(i64),
    /// 堵转（机械限位），携带最后观察到的位置
    Stalled(i64),
    /// 超时
    TimedOut,
    /// 继续轮询
    Pending,
}

/// 收敛状态机
///
/// 每次轮询调用一次 [`observe`](Self::observe)；判定顺序：
/// 容差 → 堵转 → 超时。
#[derive(Debug)]
pub struct ConvergenceTracker {
    goal: i64,
    policy: ConvergencePolicy,
    last: Option<i64>,
}

impl ConvergenceTracker {
    pub fn new(goal: i64, policy: ConvergencePolicy) -> Self {
        Self {
            goal,
            policy,
            last: None,
        }
    }

    /// 送入一次位置观察与自启动以来的耗时
    pub fn observe(&mut self, pos: i64, elapsed: Duration) -> ConvergenceStatus {
        if (pos - self.goal).abs() <= self.policy.tolerance {
            return ConvergenceStatus::Converged(pos);
        }
        if let Some(last) = self.last
            && (pos - last).abs() <= self.policy.stall_threshold
        {
            return ConvergenceStatus::Stalled(pos);
        }
        self.last = Some(pos);
        if elapsed > self.policy.timeout {
            return ConvergenceStatus::TimedOut;
        }
        ConvergenceStatus::Pending
    }
}

impl XArm {
    /// 夹爪初始化：使能 + 位置模式
    pub fn setup_gripper(&self) -> Result<(), XArmError> {
        self.enable_gripper()?;
        self.set_gripper_mode(false)
    }

    /// 夹爪使能
    pub fn enable_gripper(&self) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::GripperControl, gripper_enable_params());
        self.send(frame, true)?;
        Ok(())
    }

    /// 夹爪模式（`speed` 为速度模式，否则位置模式）
    pub fn set_gripper_mode(&self, speed: bool) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::GripperControl, gripper_mode_params(speed));
        self.send(frame, true)?;
        Ok(())
    }

    /// 下发夹爪目标位置（不等待到位）
    pub fn set_gripper_position(&self, position: u32) -> Result<(), XArmError> {
        debug!(position, "set gripper position");
        let frame =
            self.new_cmd_with(Register::GripperControl, gripper_set_position_params(position));
        self.send(frame, true)?;
        Ok(())
    }

    /// 读取夹爪当前位置
    pub fn gripper_position(&self) -> Result<u32, XArmError> {
        let frame = self.new_cmd_with(Register::GripperControl, gripper_get_position_params());
        let resp = self.send(frame, true)?;
        Ok(parse_gripper_position(&resp.params)?)
    }
}

/// 夹爪控制器
pub struct Gripper {
    arm: Arc<XArm>,
    policy: ConvergencePolicy,
    go_to_position_lock: Mutex<()>,
    moving: AtomicBool,
}

impl Gripper {
    pub fn new(arm: Arc<XArm>) -> Self {
        Self::with_policy(arm, ConvergencePolicy::default())
    }

    pub fn with_policy(arm: Arc<XArm>, policy: ConvergencePolicy) -> Self {
        Self {
            arm,
            policy,
            go_to_position_lock: Mutex::new(()),
            moving: AtomicBool::new(false),
        }
    }

    /// 闭合抓取；返回是否夹到了东西（位置未到全闭即堵转）
    pub fn grab(&self) -> Result<bool, XArmError> {
        let pos = self.go_to_position(GRAB_POSITION)?;
        Ok(pos > 10)
    }

    /// 完全张开
    pub fn open(&self) -> Result<(), XArmError> {
        self.go_to_position(OPEN_POSITION)?;
        Ok(())
    }

    /// 当前位置
    pub fn position(&self) -> Result<u32, XArmError> {
        self.arm.gripper_position()
    }

    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::SeqCst)
    }

    /// 移动到目标位置并轮询收敛；返回最后观察到的位置
    pub fn go_to_position(&self, goal: i64) -> Result<i64, XArmError> {
        let _guard = self.go_to_position_lock.lock();
        self.moving.store(true, Ordering::SeqCst);
        let result = self.go_to_position_locked(goal);
        self.moving.store(false, Ordering::SeqCst);
        result
    }

    fn go_to_position_locked(&self, goal: i64) -> Result<i64, XArmError> {
        self.arm.setup_gripper()?;
        self.arm.set_gripper_position(goal.max(0) as u32)?;

        let start = Instant::now();
        let mut tracker = ConvergenceTracker::new(goal, self.policy);
        loop {
            spin_sleep::sleep(self.policy.poll_interval);
            let pos = i64::from(self.arm.gripper_position()?);
            match tracker.observe(pos, start.elapsed()) {
                ConvergenceStatus::Converged(pos) => {
                    debug!(pos, goal, "gripper converged");
                    return Ok(pos);
                }
                ConvergenceStatus::Stalled(pos) => {
                    debug!(pos, goal, "gripper stalled at mechanical limit");
                    return Ok(pos);
                }
                ConvergenceStatus::TimedOut => {
                    return Err(XArmError::GripperTimeout {
                        goal,
                        elapsed: start.elapsed(),
                    });
                }
                ConvergenceStatus::Pending => {}
            }
        }
    }
}
