// build.rs
// 1. 读取JSON格式构建配置
// 2. 读取声明式补丁规则表并解析
// 3. 构建规则目录（VerifyGate 校验，任一规则长度不等即构建失败）
// 4. 规范化后序列化 + 可选压缩写入二进制文件
// 5. 产物供主程序通过include_bytes!固化进最终二进制
use dyldpatch_engine::CatalogDefinition;
use serde::Deserialize;
use std::error::Error;
use std::{fs, path::Path};

/// 构建期配置结构体
#[derive(Debug, Deserialize)]
struct BuildConfig {
    /// 声明式规则表路径
    raw_rules_json_path: String,
    /// 编译后二进制产物文件名
    compiled_catalog_output_name: String,
    /// 是否启用LZ4压缩
    enable_compress: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    // 未开启嵌入式规则feature时不执行构建逻辑
    if std::env::var("CARGO_FEATURE_EMBEDDED_RULES").is_err() {
        return Ok(());
    }

    // 监听文件变更，触发自动重新构建
    println!("cargo:rerun-if-changed=build_config.json");
    println!("cargo:rerun-if-changed=data/");
    println!("cargo:rerun-if-changed=build.rs");

    // 读取并解析构建配置文件
    let config_path = Path::new("build_config.json");
    let config_content = fs::read_to_string(config_path)
        .map_err(|e| format!("读取构建配置文件失败: {} - {}", config_path.display(), e))?;

    let cfg = serde_json::from_str::<BuildConfig>(&config_content)
        .map_err(|e| format!("解析build_config.json失败: {}", e))?;

    println!("cargo:rerun-if-changed={}", cfg.raw_rules_json_path);

    // 读取声明式规则表
    let json_path = Path::new(&cfg.raw_rules_json_path);
    let json_content = fs::read_to_string(json_path)
        .map_err(|e| format!("读取规则文件失败: {} - {}", json_path.display(), e))?;

    let definition = CatalogDefinition::from_json(&json_content)
        .map_err(|e| format!("解析JSON规则失败: {}", e))?;

    // 与运行期同一套校验：校验失败直接中断构建
    let catalog = definition
        .build()
        .map_err(|e| format!("规则目录校验失败: {}", e))?;

    // 规范化（字节描述统一为十六进制）后序列化
    let normalized = definition
        .normalized()
        .map_err(|e| format!("规则规范化失败: {}", e))?;
    let catalog_bin = serde_json::to_vec(&normalized)
        .map_err(|e| format!("JSON序列化规则目录失败: {}", e))?;

    // 根据配置选择是否进行LZ4压缩
    let output = if cfg.enable_compress {
        use lz4_flex::compress_prepend_size;
        compress_prepend_size(&catalog_bin)
    } else {
        catalog_bin
    };

    let out_dir = std::env::var("OUT_DIR")?;
    let out_path = Path::new(&out_dir).join(&cfg.compiled_catalog_output_name);
    fs::write(&out_path, &output)
        .map_err(|e| format!("写入规则目录二进制失败: {} - {}", out_path.display(), e))?;

    println!(
        "规则目录写入完成: {:?} → {} ({} 个规则集, {} 条规则)",
        out_dir,
        cfg.compiled_catalog_output_name,
        catalog.len(),
        catalog.rule_count()
    );

    // 向编译环境注入构建配置常量，供lib.rs读取
    println!(
        "cargo:rustc-env=COMPILED_CATALOG_FILENAME={}",
        cfg.compiled_catalog_output_name
    );
    println!(
        "cargo:rustc-env=COMPILED_CATALOG_COMPRESSED={}",
        cfg.enable_compress
    );

    Ok(())
}
