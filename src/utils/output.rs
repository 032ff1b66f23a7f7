//! # 终端输出工具
//!
//! 面向用户的输出统一走这里（带颜色标签的消息、标题栏、表格）；
//! 诊断信息走 `log`。错误写到 stderr，其余写到 stdout。
//!
//! ## 依赖关系
//! - 被 `commands/`, `batch/runner.rs`, `main.rs` 使用
//! - 使用 `colored`, `tabled` crate

use colored::{ColoredString, Colorize};
use tabled::{Table, Tabled};

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy)]
enum Tag {
    Ok,
    Err,
    Warn,
    Info,
    Done,
}

impl Tag {
    fn label(self) -> ColoredString {
        match self {
            Tag::Ok => "[OK]".green().bold(),
            Tag::Err => "[ERR]".red().bold(),
            Tag::Warn => "[WARN]".yellow().bold(),
            Tag::Info => "[*]".blue().bold(),
            Tag::Done => "[DONE]".green().bold(),
        }
    }
}

fn emit(tag: Tag, msg: &str) {
    match tag {
        Tag::Err => eprintln!("{} {}", tag.label(), msg),
        _ => println!("{} {}", tag.label(), msg),
    }
}

pub fn print_success(msg: &str) {
    emit(Tag::Ok, msg);
}

pub fn print_error(msg: &str) {
    emit(Tag::Err, msg);
}

pub fn print_warning(msg: &str) {
    emit(Tag::Warn, msg);
}

pub fn print_info(msg: &str) {
    emit(Tag::Info, msg);
}

pub fn print_done(msg: &str) {
    emit(Tag::Done, msg);
}

/// 单文件转换结果 `from -> to`
pub fn print_conversion(from: &str, to: &str) {
    println!("{} {} {} {}", Tag::Ok.label(), from.dimmed(), "->".cyan(), to);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    println!("\n{}", rule());
    println!("  {}", title.bold());
    println!("{}\n", rule());
}

pub fn print_separator() {
    println!("{}", rule());
}

/// 带标题的表格，空行集不输出
pub fn print_table<T: Tabled>(title: &str, rows: &[T]) {
    if rows.is_empty() {
        return;
    }
    print_header(title);
    println!("{}", Table::new(rows));
}

fn rule() -> ColoredString {
    "─".repeat(RULE_WIDTH).dimmed()
}
