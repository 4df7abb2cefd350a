//! dyldpatch 命令行工具
//! 对磁盘上的框架镜像执行补丁（或只扫描），逐条输出规则结果
//!
//! 运行命令：
//! cargo run --features cli -- --target SidecarCore --os-version 13.0 --input SidecarCore --dry-run

use clap::Parser;
use env_logger::{Builder, Env, Target};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use dyldpatch::{CatalogOrigin, CustomConfigBuilder, DyldPatcher, OsVersion};

#[derive(Debug, Parser)]
#[command(name = "dyldpatch", version, about = "Patch model allow-lists in framework images")]
struct Cli {
    /// 目标镜像名（SidecarCore / AirPlaySupport / CoreBrightness 或镜像路径）
    #[arg(long)]
    target: String,

    /// 系统版本，如 13.0 / 12.3 (21E5206e)
    #[arg(long = "os-version")]
    os_version: String,

    /// 输入镜像文件
    #[arg(long)]
    input: PathBuf,

    /// 输出文件，缺省时原地写回
    #[arg(long)]
    output: Option<PathBuf>,

    /// 本地 JSON 规则表，缺省使用内置规则表
    #[arg(long)]
    rules: Option<PathBuf>,

    /// 启动参数风格的功能开关，如 "-dyldpatch_allow_ipad -dyldpatch_vmm"
    #[arg(long, allow_hyphen_values = true)]
    flags: Option<String>,

    /// 只扫描不写入
    #[arg(long)]
    dry_run: bool,

    /// 以 JSON 输出会话报告
    #[arg(long)]
    json: bool,

    /// 输出调试日志
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // ========== 1. 日志系统初始化 ==========
    let default_level = if cli.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stderr)
        .init();

    // ========== 2. 补丁配置 ==========
    let origin = match &cli.rules {
        Some(path) => CatalogOrigin::LocalFile(path.clone()),
        None => CatalogOrigin::Embedded,
    };
    let config = CustomConfigBuilder::new()
        .origin(origin)
        .flags(cli.flags.as_deref().unwrap_or_default())
        .verbose(cli.verbose)
        .build();

    let os_version = OsVersion::parse(&cli.os_version)?;
    let patcher = DyldPatcher::new(config)?;
    let mut image = fs::read(&cli.input)?;

    // ========== 3. 只扫描 ==========
    if cli.dry_run {
        let records = patcher.scan_image(&cli.target, os_version, &image);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else {
            for record in &records {
                let offsets: Vec<String> = record.offsets.iter().map(|o| format!("{:#x}", o)).collect();
                println!("{}: {} match(es) [{}]", record.rule_id, record.occurrences(), offsets.join(", "));
            }
        }
        return Ok(());
    }

    // ========== 4. 补丁 + 写回 ==========
    let report = patcher.patch_image(&cli.target, os_version, &mut image)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &report.results {
            println!("{}", result);
        }
        println!(
            "{} on {}: {} ({} occurrence(s) patched)",
            report.target,
            report.os_version,
            report.outcome,
            report.patched_occurrences()
        );
    }

    if report.stats.touched() {
        let output = cli.output.as_ref().unwrap_or(&cli.input);
        fs::write(output, &image)?;
        log::info!("Patched image written to {}", output.display());
    } else if let Some(output) = &cli.output {
        fs::write(output, &image)?;
        log::info!("Image unchanged, copied to {}", output.display());
    }

    Ok(())
}
