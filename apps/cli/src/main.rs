//! xArm 命令行工具
//!
//! 操作员用的小工具：连接控制盒、查询状态、执行单次运动与
//! 末端执行器动作。Ctrl-C 取消在途运动并把机械臂恢复到
//! 可接收命令的状态。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::warn;
use xarm_driver::{Command as ArmCommand, CommandResponse, Gripper, Vacuum, XArm, XArmConfig};
use xarm_kinematics::JointModel;

#[derive(Parser)]
#[command(name = "xarm-cli", version, about = "UFACTORY xArm control box CLI")]
struct Cli {
    /// 控制盒主机名或 IP
    #[arg(long)]
    host: String,

    /// 控制盒 TCP 端口
    #[arg(long, default_value_t = 502)]
    port: u16,

    /// 设备型号（xArm6 / xArm7 / lite6）
    #[arg(long, default_value = "xArm6")]
    model: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// 查询固件版本
    Version,
    /// 查询当前关节角（弧度）
    Joints,
    /// 查询逐关节负载
    Load,
    /// 移动到目标关节角（弧度，逗号分隔，长度 = 自由度）
    Move {
        #[arg(value_delimiter = ',')]
        target: Vec<f64>,
    },
    /// 暂停当前运动并恢复到可接收命令的状态
    Stop,
    /// 关节回零
    Zero,
    /// 清除错误与警告并复位运动状态
    ClearError,
    /// 逐伺服诊断扫描
    ServoErrors,
    /// 设置速度上限（度/秒）
    SetSpeed { degs_per_sec: f64 },
    /// 设置加速度上限（度/秒²）
    SetAcceleration { degs_per_sec2: f64 },
    /// 夹爪动作
    Gripper {
        #[command(subcommand)]
        action: GripperAction,
    },
    /// 真空吸盘动作
    Vacuum {
        #[command(subcommand)]
        action: VacuumAction,
    },
}

#[derive(Subcommand)]
enum GripperAction {
    /// 完全张开
    Open,
    /// 闭合抓取
    Grab,
    /// 查询当前位置
    Position,
}

#[derive(Subcommand)]
enum VacuumAction {
    /// 开始吸取
    Grab,
    /// 停止吸取
    Open,
    /// 查询吸合状态
    State,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let model = Arc::new(
        JointModel::for_model_name(&cli.model)
            .with_context(|| format!("unknown model {:?}", cli.model))?,
    );
    let mut config = XArmConfig::new(cli.host.clone());
    config.port = cli.port;
    let arm = Arc::new(XArm::new(&config, model).context("creating driver")?);

    // Ctrl-C：取消在途运动，恢复可命令状态
    let (ctrlc_tx, ctrlc_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.try_send(());
    })
    .context("installing Ctrl-C handler")?;
    {
        let arm = arm.clone();
        std::thread::spawn(move || {
            if ctrlc_rx.recv().is_ok() {
                warn!("interrupt received, stopping motion");
                if let Err(err) = arm.stop() {
                    warn!(error = %err, "stop on interrupt failed");
                }
            }
        });
    }

    match cli.command {
        CliCommand::Version => {
            println!("{}", arm.version()?);
        }
        CliCommand::Joints => {
            let joints = arm.current_joints()?;
            println!(
                "{}",
                joints
                    .iter()
                    .map(|j| format!("{j:.5}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        CliCommand::Load => {
            if let CommandResponse::Loads(loads) = arm.execute(ArmCommand::Load)? {
                for (i, load) in loads.iter().enumerate() {
                    println!("joint {}: {load:.4}", i + 1);
                }
            }
        }
        CliCommand::Move { target } => {
            arm.move_to_joint_positions(&target)?;
            println!("done");
        }
        CliCommand::Stop => arm.stop()?,
        CliCommand::Zero => arm.zero_joints()?,
        CliCommand::ClearError => {
            arm.execute(ArmCommand::ClearError)?;
            println!("error state cleared");
        }
        CliCommand::ServoErrors => {
            let faults = arm.check_servo_errors()?;
            if faults.is_empty() {
                println!("no servo faults");
            } else {
                for fault in faults {
                    println!("servo {} (0x{:02X}): {}", fault.servo, fault.code, fault.message);
                }
            }
        }
        CliCommand::SetSpeed { degs_per_sec } => arm.set_speed(degs_per_sec)?,
        CliCommand::SetAcceleration { degs_per_sec2 } => arm.set_acceleration(degs_per_sec2)?,
        CliCommand::Gripper { action } => {
            let gripper = Gripper::new(arm.clone());
            match action {
                GripperAction::Open => gripper.open()?,
                GripperAction::Grab => {
                    let grabbed = gripper.grab()?;
                    println!("grabbed: {grabbed}");
                }
                GripperAction::Position => println!("{}", gripper.position()?),
            }
        }
        CliCommand::Vacuum { action } => {
            let vacuum = Vacuum::new(arm.clone());
            match action {
                VacuumAction::Grab => vacuum.grab()?,
                VacuumAction::Open => vacuum.open()?,
                VacuumAction::State => println!("on: {}", vacuum.state()?),
            }
        }
    }

    Ok(())
}
