//! # sga-rust
//!
//! 受 [SGA](https://github.com/jts/sga) 启发的 Rust 版重叠搜索与脚手架组装核心。
//!
//! 本 crate 提供基于压缩全文索引的近似重叠发现与脚手架拼接功能，包括：
//!
//! - **区间扩展**：正/反向索引成对的 rank/count 区间代数，免扫原文
//! - **近似搜索**：编辑预算受限的回溯搜索，枚举查询串的全部出现
//! - **重叠解析**：长度窗口与误差率受限的编辑距离 DP
//! - **脚手架组装**：按链接序依次定向、并接，输出单条共识序列
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use sga_rust::index::fm::IndexPair;
//! use sga_rust::align::search::{self, SearchParams};
//! use sga_rust::util::dna;
//!
//! // 构建成对索引并做一次固定预算的近似搜索
//! let idx = IndexPair::from_reads(&[b"ACGTACGT", b"GGTTAACC"], 64);
//! let query: Vec<u8> = b"ACGT".iter().map(|&b| dna::to_alphabet(b)).collect();
//! let mut hits = Vec::new();
//! let n = search::align_suffix_max_diff(&query, &idx, 1, 4, &SearchParams::default(), &mut hits);
//! println!("{} hits", n);
//! ```
//!
//! ## 模块说明
//!
//! - [`index`] — FM 索引查询（count/rank/rank 差分）与区间扩展代数
//! - [`align`] — 近似搜索与有界重叠 DP
//! - [`scaffold`] — 脚手架记录、序列表与共识组装
//! - [`io`] — FASTA 与 .scaf 记录读写
//! - [`util`] — DNA 编码 / 反转 / 反向互补等工具函数

pub mod align;
pub mod index;
pub mod io;
pub mod scaffold;
pub mod util;
