use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::util::dna::{self, SIGMA};

/// 按符号统计的出现次数向量，rank_diff 的结果类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlphaCount {
    counts: [i64; SIGMA],
}

impl AlphaCount {
    #[inline]
    pub fn get(&self, c: u8) -> i64 {
        self.counts[c as usize]
    }

    /// 字典序小于 c 的符号出现次数之和。
    #[inline]
    pub fn less_than(&self, c: u8) -> i64 {
        self.counts[..c as usize].iter().sum()
    }
}

/// 索引构建信息，随索引一起持久化。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexMeta {
    pub source_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 朴素 FM 索引：
/// - 字母以 [0..SIGMA) 编码（0 预留为 $，允许多个 $ 分隔不同序列）。
/// - 采用定长分块的 Occ 采样（块内顺扫补偿）。
/// - 保存完整 SA，方便把命中区间映射回文本位置。
/// - rank 运算统一走 64 位有符号整数，位置 -1 合法（计数为 0）。
#[derive(Debug, Serialize, Deserialize)]
pub struct FmIndex {
    pub sigma: u8,
    pub block: u32,
    /// C[i] = 文本中字母 < i 的累计数量
    pub c: Vec<i64>,
    /// BWT 序列（与 SA 同长度）
    pub bwt: Vec<u8>,
    /// Occ 采样（按块存储，行优先展平）：occ_samples[block_id * SIGMA + c]
    pub occ_samples: Vec<i64>,
    /// 完整 SA
    pub sa: Vec<u64>,
}

impl FmIndex {
    /// 由 BWT 与 SA 组装索引并完成 C 表 / Occ 采样。
    pub fn build(bwt: Vec<u8>, sa: Vec<u64>, block: usize) -> Self {
        let n = bwt.len();

        let mut freq = vec![0i64; SIGMA];
        for &ch in &bwt {
            let ci = ch as usize;
            if ci < SIGMA {
                freq[ci] += 1;
            }
        }
        let mut c = vec![0i64; SIGMA];
        let mut acc = 0i64;
        for i in 0..SIGMA {
            c[i] = acc;
            acc += freq[i];
        }

        let num_blocks = if n == 0 { 0 } else { (n + block - 1) / block };
        let mut occ_samples = vec![0i64; num_blocks * SIGMA];
        let mut running = vec![0i64; SIGMA];
        for bi in 0..num_blocks {
            occ_samples[bi * SIGMA..(bi + 1) * SIGMA].copy_from_slice(&running);
            let start = bi * block;
            let end = ((bi + 1) * block).min(n);
            for &ch in &bwt[start..end] {
                let ci = ch as usize;
                if ci < SIGMA {
                    running[ci] += 1;
                }
            }
        }

        Self {
            sigma: SIGMA as u8,
            block: block as u32,
            c,
            bwt,
            occ_samples,
            sa,
        }
    }

    /// 由编码文本直接构建（后缀直接排序）。文本须以 0 结尾。
    /// 仅面向测试与 CLI 的小规模输入；大规模构建不在本 crate 范围内。
    pub fn from_text(text: &[u8], block: usize) -> Self {
        let n = text.len();
        if n == 0 {
            return Self::build(Vec::new(), Vec::new(), block.max(1));
        }
        let mut sa: Vec<usize> = (0..n).collect();
        sa.sort_unstable_by(|&a, &b| text[a..].cmp(&text[b..]));

        let mut bwt = Vec::with_capacity(n);
        for &p in &sa {
            let prev = if p == 0 { text[n - 1] } else { text[p - 1] };
            bwt.push(prev);
        }
        let sa64: Vec<u64> = sa.into_iter().map(|x| x as u64).collect();
        Self::build(bwt, sa64, block.max(1))
    }

    #[inline]
    pub fn len(&self) -> i64 {
        self.bwt.len() as i64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bwt.is_empty()
    }

    /// C 表查询：文本中字典序小于 c 的符号总数。
    #[inline]
    pub fn count(&self, c: u8) -> i64 {
        self.c[c as usize]
    }

    // BWT[0..end) 中 c 的出现次数
    fn occ_prefix(&self, c: u8, end: usize) -> i64 {
        if end == 0 {
            return 0;
        }
        let block = self.block as usize;
        let bi = (end - 1) / block;
        let base = self.occ_samples[bi * SIGMA + c as usize];
        let start = bi * block;
        let mut add = 0i64;
        for &ch in &self.bwt[start..end] {
            if ch == c {
                add += 1;
            }
        }
        base + add
    }

    /// rank 查询：BWT[0..=pos] 中 c 的出现次数，pos < 0 时为 0。
    #[inline]
    pub fn rank(&self, c: u8, pos: i64) -> i64 {
        if pos < 0 {
            return 0;
        }
        let end = ((pos + 1).min(self.len())) as usize;
        self.occ_prefix(c, end)
    }

    /// rank 差分：BWT (lo, hi] 范围内各符号的出现次数向量。
    pub fn rank_diff(&self, lo: i64, hi: i64) -> AlphaCount {
        let mut out = AlphaCount::default();
        for ci in 0..SIGMA {
            let c = ci as u8;
            out.counts[ci] = self.rank(c, hi) - self.rank(c, lo);
        }
        out
    }

    /// 取出 SA 区间 [lower, upper]（双闭）对应的文本位置。
    pub fn positions(&self, lower: i64, upper: i64) -> &[u64] {
        if lower < 0 || upper < lower || upper >= self.len() {
            return &[];
        }
        &self.sa[lower as usize..=upper as usize]
    }
}

/// 正向索引与按读段反转文本的索引成对使用，支持双向扩展。
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexPair {
    pub fwd: FmIndex,
    pub rev: FmIndex,
    pub meta: IndexMeta,
}

impl IndexPair {
    /// 从一组原始序列构建：正向文本为各序列编码后以 $ 结尾拼接；
    /// 反向文本为各序列先反转再同样拼接。两侧符号计数一致。
    pub fn from_reads(reads: &[&[u8]], block: usize) -> Self {
        let mut text = Vec::new();
        let mut rtext = Vec::new();
        for &r in reads {
            let norm = dna::normalize_seq(r);
            for &b in &norm {
                text.push(dna::to_alphabet(b));
            }
            text.push(0);
            for &b in norm.iter().rev() {
                rtext.push(dna::to_alphabet(b));
            }
            rtext.push(0);
        }
        Self {
            fwd: FmIndex::from_text(&text, block),
            rev: FmIndex::from_text(&rtext, block),
            meta: IndexMeta::default(),
        }
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let mut f = std::fs::File::create(path)?;
        bincode::serialize_into(&mut f, self)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        let pair: Self = bincode::deserialize_from(f)?;
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &[u8]) -> Vec<u8> {
        let mut t: Vec<u8> = s.iter().map(|&b| dna::to_alphabet(b)).collect();
        t.push(0);
        t
    }

    #[test]
    fn count_and_rank_on_tiny_text() {
        // 文本 ACGT$，BWT 可由定义直接验证
        let fm = FmIndex::from_text(&encode(b"ACGT"), 4);
        assert_eq!(fm.len(), 5);
        // count: $ < A < C < G < T，各出现一次
        assert_eq!(fm.count(0), 0);
        assert_eq!(fm.count(1), 1);
        assert_eq!(fm.count(4), 4);
        // rank 在 -1 处为 0，在末尾处等于全文计数
        for c in 0u8..5 {
            assert_eq!(fm.rank(c, -1), 0);
        }
        let full = fm.rank_diff(-1, fm.len() - 1);
        assert_eq!(full.get(1), 1);
        assert_eq!(full.less_than(4), 4);
    }

    #[test]
    fn rank_diff_matches_direct_scan() {
        let fm = FmIndex::from_text(&encode(b"ACGTACGTTTACGN"), 3);
        let n = fm.len();
        for lo in -1..n {
            for hi in lo.max(0)..n {
                let diff = fm.rank_diff(lo, hi);
                for c in 0u8..SIGMA as u8 {
                    let direct = fm.bwt[(lo + 1) as usize..=hi as usize]
                        .iter()
                        .filter(|&&x| x == c)
                        .count() as i64;
                    assert_eq!(diff.get(c), direct, "c={} lo={} hi={}", c, lo, hi);
                }
            }
        }
    }

    #[test]
    fn positions_reject_invalid_range() {
        let fm = FmIndex::from_text(&encode(b"ACGT"), 4);
        assert!(fm.positions(3, 2).is_empty());
        assert!(fm.positions(-1, 0).is_empty());
        assert_eq!(fm.positions(0, fm.len() - 1).len(), 5);
    }

    #[test]
    fn empty_text_builds_empty_index() {
        let fm = FmIndex::from_text(&[], 4);
        assert!(fm.is_empty());
        assert_eq!(fm.rank(1, 0), 0);
    }

    #[test]
    fn index_pair_save_load_round_trip() {
        let mut pair = IndexPair::from_reads(&[b"ACGTACGT", b"GGTTAACC"], 4);
        pair.set_meta(IndexMeta {
            source_file: Some("reads.fa".to_string()),
            build_args: None,
            build_timestamp: None,
        });
        let path = std::env::temp_dir().join("sga_rust_fm_test.fm");
        let path = path.to_string_lossy().to_string();
        pair.save_to_file(&path).unwrap();
        let loaded = IndexPair::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.fwd.bwt, pair.fwd.bwt);
        assert_eq!(loaded.rev.sa, pair.rev.sa);
        assert_eq!(loaded.meta.source_file.as_deref(), Some("reads.fa"));
    }
}
