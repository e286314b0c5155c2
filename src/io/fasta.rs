use anyhow::Result;
use std::io::{BufRead, Write};

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

/// 流式 FASTA 读取器，跨行序列自动拼接。
pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        // Find header line
        let header = if let Some(h) = self.peek_header.take() {
            h
        } else {
            loop {
                self.buf.clear();
                let n = self.reader.read_line(&mut self.buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if self.buf.starts_with('>') {
                    break self.buf[1..].trim().to_string();
                }
            }
        };

        // id 取头部首个空白前的部分，描述忽略
        let id = header
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();

        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                break;
            }
            if self.buf.starts_with('>') {
                self.peek_header = Some(self.buf[1..].trim().to_string());
                break;
            }
            for &b in self.buf.as_bytes() {
                match b {
                    b'\n' | b'\r' | b' ' | b'\t' => {}
                    _ => seq.push(b.to_ascii_uppercase()),
                }
            }
        }

        Ok(Some(FastaRecord { id, seq }))
    }
}

/// 写出一条 FASTA 记录，序列按 width 列折行（0 表示不折行）。
pub fn write_fasta_record<W: Write>(w: &mut W, id: &str, seq: &[u8], width: usize) -> Result<()> {
    writeln!(w, ">{}", id)?;
    if width == 0 {
        w.write_all(seq)?;
        writeln!(w)?;
        return Ok(());
    }
    for chunk in seq.chunks(width) {
        w.write_all(chunk)?;
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn reads_multi_record_fasta() {
        let data = b">c1 first contig\nACGT\nacgt\n>c2\nGGGG\n";
        let mut reader = FastaReader::new(BufReader::new(&data[..]));
        let r1 = reader.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "c1");
        assert_eq!(r1.seq, b"ACGTACGT".to_vec());
        let r2 = reader.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "c2");
        assert_eq!(r2.seq, b"GGGG".to_vec());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn empty_input_yields_no_records() {
        let mut reader = FastaReader::new(BufReader::new(&b""[..]));
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn writer_wraps_lines() {
        let mut out = Vec::new();
        write_fasta_record(&mut out, "s1", b"ACGTACGTAC", 4).unwrap();
        assert_eq!(out, b">s1\nACGT\nACGT\nAC\n".to_vec());
    }

    #[test]
    fn write_read_round_trip() {
        let mut out = Vec::new();
        write_fasta_record(&mut out, "scaffold-1", b"ACGTNNNNGGTT", 80).unwrap();
        let mut reader = FastaReader::new(BufReader::new(&out[..]));
        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.id, "scaffold-1");
        assert_eq!(rec.seq, b"ACGTNNNNGGTT".to_vec());
    }
}
