use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::scaffold::record::ScaffoldRecord;

/// 读入 .scaf 文件：一行一条记录，空行跳过。
/// 单行解析失败即该记录的致命错误，错误信息带上行号。
pub fn read_records<R: BufRead>(reader: R) -> Vec<(usize, Result<ScaffoldRecord>)> {
    let mut out = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let lineno = lineno + 1;
        let parsed = line
            .map_err(anyhow::Error::from)
            .and_then(|l| {
                if l.trim().is_empty() {
                    Ok(None)
                } else {
                    ScaffoldRecord::parse(&l).map(Some)
                }
            })
            .with_context(|| format!("scaf line {}", lineno));
        match parsed {
            Ok(None) => {}
            Ok(Some(rec)) => out.push((lineno, Ok(rec))),
            Err(e) => out.push((lineno, Err(e))),
        }
    }
    out
}

/// 依次写出记录，每条一行。
pub fn write_records<W: Write>(w: &mut W, records: &[ScaffoldRecord]) -> Result<()> {
    for rec in records {
        rec.write_record(w)?;
    }
    Ok(())
}
