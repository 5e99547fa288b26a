//! 驱动集成测试
//!
//! 进程内 mock 控制盒：一个 std TcpListener 线程按真实帧格式
//! 应答，用来端到端验证错误检查发送、故障分类与自动复位、
//! 断线重连、截断响应、流式运动与夹爪收敛，全程无硬件。

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use xarm_driver::{
    Command, CommandResponse, ConvergencePolicy, Gripper, JointModel, Joints, XArm, XArmConfig,
    XArmError,
};

// ============================================================================
// mock 控制盒
// ============================================================================

const REG_VERSION: u8 = 0x01;
const REG_TOGGLE_SERVO: u8 = 0x0B;
const REG_SET_STATE: u8 = 0x0C;
const REG_GET_STATE: u8 = 0x0D;
const REG_GET_ERROR: u8 = 0x0F;
const REG_CLEAR_ERROR: u8 = 0x10;
const REG_CLEAR_WARN: u8 = 0x11;
const REG_SET_MODE: u8 = 0x13;
const REG_MOVE_JOINTS: u8 = 0x1D;
const REG_JOINT_POS: u8 = 0x2A;
const REG_CURRENT_TORQUE: u8 = 0x37;
const REG_SERVO_ERROR: u8 = 0x6A;
const REG_GRIPPER: u8 = 0x7C;
const REG_VACUUM: u8 = 0x7F;
const REG_VACUUM_STATE: u8 = 0x80;

#[derive(Debug)]
struct BoxState {
    joints: [f64; 6],
    state_byte: u8,
    error_code: u8,
    warn_code: u8,
    moving: bool,
    gripper_position: u32,
    gripper_script: VecDeque<u32>,
    servo_codes: [u8; 8],
    vacuum_on: bool,
    /// 下一个响应谎报长度后立即断开
    truncate_next: bool,
    /// (reg, params) 接收日志
    received: Vec<(u8, Vec<u8>)>,
}

impl Default for BoxState {
    fn default() -> Self {
        Self {
            joints: [0.0; 6],
            state_byte: 0,
            error_code: 0,
            warn_code: 0,
            moving: false,
            gripper_position: 840,
            gripper_script: VecDeque::new(),
            servo_codes: [0x01; 8],
            vacuum_on: false,
            truncate_next: false,
            received: Vec::new(),
        }
    }
}

struct MockBox {
    addr: std::net::SocketAddr,
    state: Arc<Mutex<BoxState>>,
}

impl MockBox {
    fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock box");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(Mutex::new(BoxState::default()));
        let serve_state = state.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let _ = serve_connection(&mut stream, &serve_state);
            }
        });
        Self { addr, state }
    }

    fn config(&self) -> XArmConfig {
        let mut config = XArmConfig::new(self.addr.ip().to_string());
        config.port = self.addr.port();
        config
    }

    fn arm(&self) -> XArm {
        let model = Arc::new(JointModel::xarm6().expect("builtin model"));
        XArm::new(&self.config(), model).expect("driver")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoxState> {
        self.state.lock().expect("box state")
    }

    fn received_regs(&self) -> Vec<u8> {
        self.lock().received.iter().map(|(reg, _)| *reg).collect()
    }
}

fn serve_connection(stream: &mut TcpStream, state: &Arc<Mutex<BoxState>>) -> std::io::Result<()> {
    loop {
        let mut header = [0u8; 6];
        stream.read_exact(&mut header)?;
        let tid = u16::from_be_bytes([header[0], header[1]]);
        let length = u16::from_be_bytes([header[4], header[5]]) as usize;
        let mut body = vec![0u8; length];
        stream.read_exact(&mut body)?;
        let reg = body[0];
        let params = body[1..].to_vec();

        let mut st = state.lock().expect("box state");
        st.received.push((reg, params.clone()));

        if st.truncate_next {
            st.truncate_next = false;
            drop(st);
            // 声明 64 字节 params，只发 2 字节就断开
            let mut resp = Vec::new();
            resp.extend(tid.to_be_bytes());
            resp.extend(2u16.to_be_bytes());
            resp.extend(65u16.to_be_bytes());
            resp.push(reg);
            resp.extend([0u8, 0]);
            stream.write_all(&resp)?;
            return Ok(());
        }

        let reply = respond(reg, &params, &mut st);
        drop(st);

        let mut resp = Vec::with_capacity(7 + reply.len());
        resp.extend(tid.to_be_bytes());
        resp.extend(2u16.to_be_bytes());
        resp.extend(((1 + reply.len()) as u16).to_be_bytes());
        resp.push(reg);
        resp.extend(&reply);
        stream.write_all(&resp)?;
    }
}

fn respond(reg: u8, params: &[u8], st: &mut BoxState) -> Vec<u8> {
    match reg {
        REG_JOINT_POS => {
            let mut reply = vec![st.state_byte];
            for joint in st.joints {
                reply.extend((joint as f32).to_le_bytes());
            }
            reply.extend([0u8; 4]); // 第 7 关节
            reply
        }
        REG_GET_STATE => vec![st.state_byte, u8::from(st.moving)],
        REG_GET_ERROR => vec![st.state_byte, st.error_code, st.warn_code],
        REG_CLEAR_ERROR => {
            st.error_code = 0;
            st.state_byte &= !0b0110_0000;
            vec![st.state_byte]
        }
        REG_CLEAR_WARN => {
            st.warn_code = 0;
            vec![st.state_byte]
        }
        REG_MOVE_JOINTS => {
            // 跟踪最新指令位置，让 JointPos 查询保持一致
            for (i, joint) in st.joints.iter_mut().enumerate() {
                let idx = i * 4;
                if idx + 4 <= params.len() {
                    let bytes = [params[idx], params[idx + 1], params[idx + 2], params[idx + 3]];
                    *joint = f64::from(f32::from_le_bytes(bytes));
                }
            }
            vec![st.state_byte]
        }
        REG_CURRENT_TORQUE => {
            let mut reply = vec![st.state_byte];
            for i in 0..7 {
                reply.extend((0.1 * (i + 1) as f32).to_le_bytes());
            }
            reply
        }
        REG_VERSION => {
            let mut reply = vec![st.state_byte];
            reply.extend(b"v2.4.101\0\0");
            reply
        }
        REG_SERVO_ERROR => {
            let mut reply = vec![0u8; 18];
            reply[0] = st.state_byte;
            for (slot, code) in st.servo_codes.iter().enumerate() {
                reply[(slot + 1) * 2] = *code;
            }
            reply
        }
        REG_GRIPPER => {
            if params.first() == Some(&0x09) && params.get(2) == Some(&0x03) {
                // 位置读取
                let pos = st
                    .gripper_script
                    .pop_front()
                    .unwrap_or(st.gripper_position);
                st.gripper_position = pos;
                let mut reply = vec![st.state_byte, 9, 8, 3, 4];
                reply.extend(pos.to_be_bytes());
                reply
            } else {
                vec![st.state_byte]
            }
        }
        REG_VACUUM => {
            // [host][id][0x15][0x00][value][ch][0x43|0x44]
            if params.get(6) == Some(&0x43) {
                st.vacuum_on = params.get(4) == Some(&0x80);
            }
            vec![st.state_byte]
        }
        REG_VACUUM_STATE => vec![st.state_byte, 9, 10, 0, u8::from(st.vacuum_on)],
        REG_SET_STATE | REG_SET_MODE | REG_TOGGLE_SERVO => vec![st.state_byte],
        _ => vec![st.state_byte],
    }
}

// ============================================================================
// 测试
// ============================================================================

/// 无运动时两次查询返回相同关节角
#[test]
fn test_joint_positions_idempotent() {
    let mock = MockBox::spawn();
    mock.lock().joints = [0.1, -0.2, -0.3, 0.4, 0.5, -0.6];

    let arm = mock.arm();
    let first = arm.current_joints().unwrap();
    let second = arm.current_joints().unwrap();
    assert_eq!(first, second);
    assert!((first[0] - 0.1).abs() < 1e-6);
    assert_eq!(first.len(), 6);
}

/// 已知错误码：分类为可恢复，自动清除并复位后仍上抛
#[test]
fn test_recoverable_fault_clears_and_resets() {
    let mock = MockBox::spawn();
    {
        let mut st = mock.lock();
        st.state_byte = 1 << 6;
        st.error_code = 0x13; // Gripper Communication Error
    }

    let arm = mock.arm();
    let err = arm.current_joints().unwrap_err();
    match err {
        XArmError::DeviceRecoverable { description } => {
            assert!(description.contains("Gripper Communication Error"));
        }
        other => panic!("expected DeviceRecoverable, got {other}"),
    }

    // 自动复位序列：清错误、清警告、伺服模式、运动状态 0
    let regs = mock.received_regs();
    let clear_idx = regs.iter().position(|r| *r == REG_CLEAR_ERROR).unwrap();
    assert_eq!(regs[clear_idx + 1], REG_CLEAR_WARN);
    assert_eq!(regs[clear_idx + 2], REG_SET_MODE);
    assert_eq!(regs[clear_idx + 3], REG_SET_STATE);

    // 复位后错误已清除，后续查询成功
    assert!(arm.current_joints().is_ok());
}

/// 碰撞过流：致命，绝不自动清除
#[test]
fn test_collision_fault_is_fatal_no_auto_clear() {
    let mock = MockBox::spawn();
    {
        let mut st = mock.lock();
        st.state_byte = 1 << 6;
        st.error_code = 0x1F;
    }

    let arm = mock.arm();
    let err = arm.current_joints().unwrap_err();
    assert!(matches!(err, XArmError::DeviceFatal));
    assert!(
        !mock.received_regs().contains(&REG_CLEAR_ERROR),
        "fatal fault must not be auto-cleared"
    );
}

/// 码表外错误码：Unknown，仍执行复位，绝不静默
#[test]
fn test_unknown_fault_surfaced() {
    let mock = MockBox::spawn();
    {
        let mut st = mock.lock();
        st.state_byte = 1 << 5;
        st.error_code = 0x42;
    }

    let arm = mock.arm();
    let err = arm.current_joints().unwrap_err();
    assert!(matches!(
        err,
        XArmError::DeviceUnknown {
            error_code: 0x42,
            ..
        }
    ));
    assert!(mock.received_regs().contains(&REG_CLEAR_ERROR));
}

/// 谎报长度的截断响应：解码错误而不是挂死；
/// 连接失效后下一次调用透明重连
#[test]
fn test_truncated_response_then_reconnect() {
    let mock = MockBox::spawn();
    let arm = mock.arm();

    assert!(arm.current_joints().is_ok());

    mock.lock().truncate_next = true;
    let err = arm.current_joints().unwrap_err();
    assert!(matches!(err, XArmError::Protocol(_)), "got {err}");

    // 重连后正常工作
    assert!(arm.current_joints().is_ok());
}

/// Close 之后所有调用快速失败
#[test]
fn test_closed_fails_fast() {
    let mock = MockBox::spawn();
    let arm = mock.arm();

    assert!(arm.current_joints().is_ok());
    arm.close().unwrap();

    assert!(matches!(arm.current_joints().unwrap_err(), XArmError::Closed));
    assert!(matches!(
        arm.execute(Command::Load).unwrap_err(),
        XArmError::Closed
    ));
}

/// 端到端流式运动：start 序列 + 每步一帧 MoveJoints
#[test]
fn test_move_streams_joint_frames() {
    let mock = MockBox::spawn();
    let arm = mock.arm();

    let mut goal = Joints::from_slice(&[0.0; 6]);
    goal[0] = 0.05;
    arm.move_to_joint_positions(&goal).unwrap();

    let st = mock.lock();
    let move_frames: Vec<&Vec<u8>> = st
        .received
        .iter()
        .filter(|(reg, _)| *reg == REG_MOVE_JOINTS)
        .map(|(_, params)| params)
        .collect();
    assert!(!move_frames.is_empty());
    // 7 关节 × f32 + 3 个保留 u32
    for params in &move_frames {
        assert_eq!(params.len(), 40);
    }

    // 运动前完成 start 序列
    let regs: Vec<u8> = st.received.iter().map(|(reg, _)| *reg).collect();
    let servo_idx = regs.iter().position(|r| *r == REG_TOGGLE_SERVO).unwrap();
    let first_move = regs.iter().position(|r| *r == REG_MOVE_JOINTS).unwrap();
    assert!(servo_idx < first_move);

    // 机械臂最终落在目标附近
    assert!((st.joints[0] - 0.05).abs() < 1e-2);
}

/// Stop 取消在途运动：流式循环在帧间观察到取消
#[test]
fn test_stop_cancels_inflight_move() {
    let mock = MockBox::spawn();
    let arm = Arc::new(mock.arm());

    let mover = {
        let arm = arm.clone();
        thread::spawn(move || {
            let mut goal = Joints::from_slice(&[0.0; 6]);
            goal[0] = 1.0; // 默认速度下 >1s 的运动
            arm.move_to_joint_positions(&goal)
        })
    };

    // 等运动开始流式下发
    thread::sleep(Duration::from_millis(200));
    assert!(arm.is_moving());
    arm.stop().unwrap();

    let result = mover.join().unwrap();
    assert!(matches!(result.unwrap_err(), XArmError::Cancelled));
    assert!(!arm.is_moving());
}

/// 夹爪收敛：位置进入容差即返回
#[test]
fn test_gripper_converges() {
    let mock = MockBox::spawn();
    mock.lock().gripper_script = VecDeque::from([100, 50, 6]);

    let gripper = Gripper::new(Arc::new(mock.arm()));
    // 6 距离目标 2 在容差 6 内；位置 ≤10 → 没抓到东西
    assert!(!gripper.grab().unwrap());
}

/// 夹爪堵转：相邻轮询变化 ≤3，返回最后位置 → 抓到了东西
#[test]
fn test_gripper_stall_means_grabbed() {
    let mock = MockBox::spawn();
    mock.lock().gripper_script = VecDeque::from([500, 450, 448]);

    let gripper = Gripper::new(Arc::new(mock.arm()));
    assert!(gripper.grab().unwrap());
}

/// 夹爪超时：错误携带目标与耗时
#[test]
fn test_gripper_timeout() {
    let mock = MockBox::spawn();
    {
        let mut st = mock.lock();
        // 一直在动（Δ10 > 堵转阈值 3），但永远到不了目标 2
        st.gripper_script = (0..60u32).map(|i| 2000 - i * 10).collect();
    }

    let policy = ConvergencePolicy {
        timeout: Duration::from_millis(200),
        ..ConvergencePolicy::default()
    };
    let gripper = Gripper::with_policy(Arc::new(mock.arm()), policy);
    let err = gripper.go_to_position(2).unwrap_err();
    match err {
        XArmError::GripperTimeout { goal, elapsed } => {
            assert_eq!(goal, 2);
            assert!(elapsed >= Duration::from_millis(200));
        }
        other => panic!("expected GripperTimeout, got {other}"),
    }
}

/// 真空吸盘：双通道命令对 + 状态查询
#[test]
fn test_vacuum_grab_open_state() {
    let mock = MockBox::spawn();
    let arm = mock.arm();

    arm.execute(Command::GrabVacuum).unwrap();
    assert_eq!(
        arm.execute(Command::GetVacuumState).unwrap(),
        CommandResponse::VacuumState(true)
    );

    arm.execute(Command::OpenVacuum).unwrap();
    assert_eq!(
        arm.execute(Command::GetVacuumState).unwrap(),
        CommandResponse::VacuumState(false)
    );
}

/// 逐伺服诊断：聚合所有槽位的命中
#[test]
fn test_servo_error_sweep() {
    let mock = MockBox::spawn();
    {
        let mut st = mock.lock();
        st.servo_codes[2] = 0x0F; // 槽位 3: Joints Overheat
        st.servo_codes[7] = 0x22; // 槽位 8（夹爪通道）: Motor Overload
    }

    let arm = mock.arm();
    let faults = arm.check_servo_errors().unwrap();
    assert_eq!(faults.len(), 2);
    assert_eq!(faults[0].servo, 3);
    assert!(faults[0].message.contains("Overheat"));
    assert_eq!(faults[1].servo, 8);
}

/// 辅助命令面：负载 / 版本 / 原始状态
#[test]
fn test_auxiliary_commands() {
    let mock = MockBox::spawn();
    let arm = mock.arm();

    match arm.execute(Command::Load).unwrap() {
        CommandResponse::Loads(loads) => {
            assert_eq!(loads.len(), 6);
            assert!((loads[0] - 0.1).abs() < 1e-6);
        }
        other => panic!("expected Loads, got {other:?}"),
    }

    assert_eq!(arm.version().unwrap(), "v2.4.101");

    match arm.execute(Command::GetRawState).unwrap() {
        CommandResponse::RawState(params) => assert_eq!(params.len(), 2),
        other => panic!("expected RawState, got {other:?}"),
    }
}

/// ClearError 命令可作为碰撞急停后的人工清除入口
#[test]
fn test_clear_error_command() {
    let mock = MockBox::spawn();
    {
        let mut st = mock.lock();
        st.state_byte = 1 << 6;
        st.error_code = 0x1F;
    }

    let arm = mock.arm();
    assert!(matches!(
        arm.current_joints().unwrap_err(),
        XArmError::DeviceFatal
    ));

    arm.execute(Command::ClearError).unwrap();
    assert!(arm.current_joints().is_ok());
}
