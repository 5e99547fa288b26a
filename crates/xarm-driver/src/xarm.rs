//! 驱动核心：`XArm` 结构体与设备命令
//!
//! 对外 API 全部为同步调用（`&self`），内部并发安全：
//! - 传输层序列化锁保证线上最多一个请求在途
//! - 运动 profile 以 `ArcSwap` 快照读取，修改不会撕裂在途的轨迹生成
//! - 单操作管理器保证每实例最多一个运动操作，新操作取消旧操作

use crate::config::XArmConfig;
use crate::error::XArmError;
use crate::operation::{OperationHandle, OperationManager};
use crate::profile::{MotionProfile, MoveOptions};
use crate::trajectory;
use crate::transport::Transport;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use xarm_kinematics::{Joints, KinematicModel};
use xarm_protocol::{
    classify, has_error_or_warning, parse_joint_loads, parse_joint_positions, parse_servo_faults,
    servo_move_params, toggle_params, CommandFrame, DeviceFault, ErrorReport, MotionMode,
    MotionState, ProtocolError, Register, ResponseFrame, ServoFault, SAMPLE_RATE_HZ,
    STATE_NOT_READY,
};

/// UFACTORY xArm 驱动实例
///
/// 运动学模型由构造方注入（显式参数，而不是加载期副作用的
/// 全局注册表）；自由度取自模型。
pub struct XArm {
    model: Arc<dyn KinematicModel>,
    dof: usize,
    transport: Transport,
    tid: AtomicU16,
    profile: ArcSwap<MotionProfile>,
    started: AtomicBool,
    ops: OperationManager,
}

impl XArm {
    /// 创建驱动实例
    ///
    /// 校验配置后立即返回；连接在首次命令时按需建立。
    pub fn new(
        config: &XArmConfig,
        model: Arc<dyn KinematicModel>,
    ) -> Result<Self, XArmError> {
        config.validate()?;
        info!(host = %config.host, model = model.name(), "creating xArm driver");
        Ok(Self {
            dof: model.dof(),
            model,
            transport: Transport::new(config.addr()),
            tid: AtomicU16::new(0),
            profile: ArcSwap::from_pointee(config.motion_profile()),
            started: AtomicBool::new(false),
            ops: OperationManager::new(),
        })
    }

    /// 自由度
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// 运动学模型
    pub fn model(&self) -> &Arc<dyn KinematicModel> {
        &self.model
    }

    /// 当前运动 profile 快照
    pub fn motion_profile(&self) -> MotionProfile {
        **self.profile.load()
    }

    // ========================================================================
    // 命令分帧与错误检查发送
    // ========================================================================

    fn next_tid(&self) -> u16 {
        self.tid.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub(crate) fn new_cmd(&self, reg: Register) -> CommandFrame {
        CommandFrame::new(self.next_tid(), reg)
    }

    pub(crate) fn new_cmd_with(&self, reg: Register, params: Vec<u8>) -> CommandFrame {
        CommandFrame::with_params(self.next_tid(), reg, params)
    }

    /// 发送一帧；`check_error` 时检查响应状态字节的错误/警告位
    ///
    /// 状态位置位时追加一次 GetError 查询并分类：碰撞过流立即返回
    /// `DeviceFatal`（绝不自动清除）；其余任何非碰撞错误码——包括
    /// 码表外无法进一步解释的——先清错误/清警告并复位运动模式与
    /// 运动状态，把设备恢复到可伺服状态，然后仍把错误上抛（触发它
    /// 的命令并没有完成）。这种无差别自动复位是否对所有码都安全
    /// 值得设备厂商确认（TODO: 与 UFACTORY 确认逐码复位语义），
    /// 当前保持与既有部署一致的行为。
    pub(crate) fn send(
        &self,
        frame: CommandFrame,
        check_error: bool,
    ) -> Result<ResponseFrame, XArmError> {
        let resp = self.transport.exchange(&frame)?;
        if !check_error {
            return Ok(resp);
        }
        let state = resp.state_byte().ok_or(ProtocolError::UnexpectedParams {
            what: "state byte",
            expected: 1,
            actual: 0,
        })?;
        if !has_error_or_warning(state) {
            return Ok(resp);
        }

        let report = self.error_report()?;
        match classify(&report) {
            DeviceFault::Fatal(description) => {
                warn!(code = report.error_code, description, "fatal device fault");
                Err(XArmError::DeviceFatal)
            }
            DeviceFault::Recoverable { error, warning } => {
                let description = error
                    .into_iter()
                    .chain(warning)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(%description, "recoverable device fault, clearing and resetting");
                self.reset_after_fault();
                Err(XArmError::DeviceRecoverable { description })
            }
            DeviceFault::Unknown {
                error_code,
                warn_code,
            } => {
                warn!(error_code, warn_code, "unrecognized device fault");
                self.reset_after_fault();
                Err(XArmError::DeviceUnknown {
                    error_code,
                    warn_code,
                })
            }
        }
    }

    fn reset_after_fault(&self) {
        if let Err(err) = self.reset_error_state() {
            warn!(error = %err, "failed to reset error state after device fault");
        }
    }

    /// 查询详细错误报告 `{state, error_code, warning_code}`
    pub(crate) fn error_report(&self) -> Result<ErrorReport, XArmError> {
        let frame = self.new_cmd(Register::GetError);
        let resp = self.transport.exchange(&frame)?;
        Ok(ErrorReport::parse(&resp.params)?)
    }

    /// 清错误 + 清警告 + 复位运动模式与运动状态
    ///
    /// 四步全部执行（不短路），返回遇到的第一个错误。
    pub(crate) fn reset_error_state(&self) -> Result<(), XArmError> {
        let mut first_err = None;
        for reg in [Register::ClearError, Register::ClearWarn] {
            if let Err(err) = self.transport.exchange(&self.new_cmd(reg)) {
                first_err.get_or_insert(err);
            }
        }
        let mode = self.new_cmd_with(Register::SetMode, vec![MotionMode::Servo.into()]);
        if let Err(err) = self.transport.exchange(&mode) {
            first_err.get_or_insert(err);
        }
        let state = self.new_cmd_with(Register::SetState, vec![MotionState::Servo.into()]);
        if let Err(err) = self.transport.exchange(&state) {
            first_err.get_or_insert(err);
        }
        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    // ========================================================================
    // 运动状态/模式/伺服
    // ========================================================================

    /// 设置运动状态
    pub fn set_motion_state(&self, state: MotionState) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::SetState, vec![state.into()]);
        self.send(frame, true)?;
        Ok(())
    }

    /// 设置运动模式
    pub fn set_motion_mode(&self, mode: MotionMode) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::SetMode, vec![mode.into()]);
        self.send(frame, true)?;
        Ok(())
    }

    /// 伺服使能开关：true 使能并松开抱闸，false 去使能（不上抱闸）
    pub fn toggle_servos(&self, enable: bool) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::ToggleServo, toggle_params(enable));
        self.send(frame, true)?;
        Ok(())
    }

    /// 抱闸开关：true 松开抱闸，false 上抱闸
    pub fn toggle_brake(&self, disengage: bool) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::ToggleBrake, toggle_params(disengage));
        self.send(frame, true)?;
        Ok(())
    }

    /// 使设备进入可伺服流式运动的状态（幂等）
    pub fn start(&self) -> Result<(), XArmError> {
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        self.toggle_servos(true)?;
        self.set_motion_mode(MotionMode::Servo)?;
        self.set_motion_state(MotionState::Servo)?;
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    /// 机械臂所有部件是否已停止运动
    pub fn motion_stopped(&self) -> Result<bool, XArmError> {
        let resp = self.send(self.new_cmd(Register::GetState), true)?;
        if resp.params.len() < 2 {
            return Err(ProtocolError::UnexpectedParams {
                what: "motion state",
                expected: 2,
                actual: resp.params.len(),
            }
            .into());
        }
        Ok(resp.params[1] != 1)
    }

    /// 是否有运动操作在途
    pub fn is_moving(&self) -> bool {
        self.ops.op_running()
    }

    /// 暂停当前运动并重新初始化，使机械臂可以继续接收命令
    pub fn stop(&self) -> Result<(), XArmError> {
        let _op = self.ops.begin();
        self.started.store(false, Ordering::Release);
        self.set_motion_state(MotionState::Suspend)?;
        self.start()
    }

    /// 关闭驱动：上抱闸、去使能伺服、停止运动，然后标记关闭
    ///
    /// 停机命令尽力而为（不短路），无论成败驱动都被标记关闭；
    /// 之后任何命令（含在途的）都快速失败，不再尝试 I/O。
    pub fn close(&self) -> Result<(), XArmError> {
        let _op = self.ops.begin();
        let mut first_err = None;
        if self.transport.has_connection() {
            if let Err(err) = self.toggle_brake(false) {
                first_err.get_or_insert(err);
            }
            if let Err(err) = self.toggle_servos(false) {
                first_err.get_or_insert(err);
            }
            if let Err(err) = self.set_motion_state(MotionState::Stop) {
                first_err.get_or_insert(err);
            }
        }
        self.transport.close();
        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    // ========================================================================
    // 查询
    // ========================================================================

    /// 当前关节角（弧度）
    pub fn current_joints(&self) -> Result<Joints, XArmError> {
        let resp = self.send(self.new_cmd(Register::JointPos), true)?;
        Ok(parse_joint_positions(&resp.params, self.dof)?.into())
    }

    /// 逐关节负载（电流/力矩）
    pub fn get_load(&self) -> Result<Vec<f64>, XArmError> {
        let resp = self.send(self.new_cmd(Register::CurrentTorque), true)?;
        Ok(parse_joint_loads(&resp.params, self.dof)?)
    }

    /// 控制盒固件版本串
    pub fn version(&self) -> Result<String, XArmError> {
        let resp = self.send(self.new_cmd(Register::Version), false)?;
        let raw = resp.params.get(1..).unwrap_or_default();
        Ok(String::from_utf8_lossy(raw)
            .trim_end_matches('\0')
            .trim()
            .to_string())
    }

    /// 逐伺服诊断扫描
    ///
    /// 查询全部伺服槽位（1..=8，含夹爪通道）的逐关节错误码。
    /// 纯诊断用途，不在热路径上；聚合所有命中，不短路。
    pub fn check_servo_errors(&self) -> Result<Vec<ServoFault>, XArmError> {
        let resp = self.send(self.new_cmd(Register::ServoError), false)?;
        Ok(parse_servo_faults(&resp.params)?)
    }

    // ========================================================================
    // 配置命令
    // ========================================================================

    /// 设置速度上限（度/秒）
    pub fn set_speed(&self, degs_per_sec: f64) -> Result<(), XArmError> {
        if degs_per_sec <= 0.0 {
            return Err(XArmError::Validation(
                "speed cannot be less than or equal to zero".to_string(),
            ));
        }
        self.profile.rcu(|profile| MotionProfile {
            speed: degs_per_sec.to_radians(),
            ..**profile
        });
        Ok(())
    }

    /// 设置加速度上限（度/秒²）
    pub fn set_acceleration(&self, degs_per_sec2: f64) -> Result<(), XArmError> {
        if degs_per_sec2 <= 0.0 {
            return Err(XArmError::Validation(
                "acceleration cannot be less than or equal to zero".to_string(),
            ));
        }
        self.profile.rcu(|profile| MotionProfile {
            acceleration: degs_per_sec2.to_radians(),
            ..**profile
        });
        Ok(())
    }

    /// 设置碰撞灵敏度（0..=5）
    pub fn set_collision_sensitivity(&self, sensitivity: u8) -> Result<(), XArmError> {
        if sensitivity > 5 {
            return Err(XArmError::Validation(format!(
                "collision sensitivity {sensitivity} outside [0, 5]"
            )));
        }
        let frame = self.new_cmd_with(Register::Sensitivity, vec![sensitivity]);
        self.send(frame, true)?;
        Ok(())
    }

    /// 设置末端执行器型号
    pub fn set_end_effector_model(&self, model_id: u8) -> Result<(), XArmError> {
        let frame = self.new_cmd_with(Register::SetEndEffectorModel, vec![model_id]);
        self.send(frame, true)?;
        Ok(())
    }

    /// 关节回零
    pub fn zero_joints(&self) -> Result<(), XArmError> {
        self.send(self.new_cmd(Register::ZeroJoints), true)?;
        Ok(())
    }

    // ========================================================================
    // 运动
    // ========================================================================

    /// 移动到单个目标关节构型
    pub fn move_to_joint_positions(&self, goal: &[f64]) -> Result<(), XArmError> {
        let op = self.ops.begin();
        let waypoints = [Joints::from_slice(goal)];
        self.move_through_in_op(&op, &waypoints, None)
    }

    /// 依次穿过一组目标关节构型
    ///
    /// 整条路径应用一个梯形速度曲线（见 [`trajectory`]）。
    /// 开始新运动会取消任何在途运动。
    pub fn move_through_joint_positions(
        &self,
        waypoints: &[Joints],
        opts: Option<MoveOptions>,
    ) -> Result<(), XArmError> {
        let op = self.ops.begin();
        self.move_through_in_op(&op, waypoints, opts)
    }

    fn move_through_in_op(
        &self,
        op: &OperationHandle<'_>,
        waypoints: &[Joints],
        opts: Option<MoveOptions>,
    ) -> Result<(), XArmError> {
        let opts = opts.map(MoveOptions::clamped);

        self.set_motion_mode(MotionMode::Servo)?;

        // 设备刚重启/急停过：必须把运动状态置回伺服才可运动
        let report = self.error_report()?;
        if report.state == STATE_NOT_READY {
            self.set_motion_state(MotionState::Servo)?;
        }

        for goal in waypoints {
            self.model.check(goal)?;
        }

        let current = self.current_joints()?;
        let mut profile = self.motion_profile();
        if let Some(opts) = &opts {
            profile = profile.with_options(opts);
        }
        let steps = trajectory::create_raw_joint_steps(
            self.model.as_ref(),
            &current,
            waypoints,
            profile,
            SAMPLE_RATE_HZ,
        )?;
        debug!(steps = steps.len(), waypoints = waypoints.len(), "streaming trajectory");
        self.execute_steps(op, &steps)
    }

    /// 以固定采样率逐帧下发步序列
    ///
    /// 每步一帧（servo-mode streaming），经错误检查发送；相邻两帧
    /// 之间等待一个采样间隔。取消在帧间生效，绝不打断在途帧。
    fn execute_steps(
        &self,
        op: &OperationHandle<'_>,
        steps: &[Joints],
    ) -> Result<(), XArmError> {
        self.start()?;
        let interval = Duration::from_secs_f64(1.0 / SAMPLE_RATE_HZ);
        for step in steps {
            if op.cancelled() {
                debug!("trajectory cancelled between steps");
                return Err(XArmError::Cancelled);
            }
            let frame = self.new_cmd_with(Register::MoveJoints, servo_move_params(step));
            self.send(frame, true)?;
            spin_sleep::sleep(interval);
        }
        Ok(())
    }
}
