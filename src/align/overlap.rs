/// 序列上的双闭坐标区间，seq_len 记录宿主序列长度。
/// start > end 表示空区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqCoord {
    pub start: usize,
    pub end: usize,
    pub seq_len: usize,
}

impl SeqCoord {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// 宿主序列上的补区间：区间外仍待使用的部分。
    /// 仅对贴齐序列一端的区间有意义（本模块只产生这类区间）。
    pub fn complement(&self) -> SeqCoord {
        if self.start == 0 {
            SeqCoord {
                start: self.end + 1,
                end: self.seq_len.saturating_sub(1),
                seq_len: self.seq_len,
            }
        } else {
            SeqCoord {
                start: 0,
                end: self.start - 1,
                seq_len: self.seq_len,
            }
        }
    }

    pub fn substring<'a>(&self, seq: &'a [u8]) -> &'a [u8] {
        if self.is_empty() || self.start >= seq.len() {
            return &[];
        }
        &seq[self.start..=self.end.min(seq.len() - 1)]
    }
}

/// 重叠解析结果：coord[0] 为 s1（共识串）侧的对齐区域，
/// coord[1] 为 s2（新片段）侧；coord[1] 的补即真正要追加的悬垂。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapMatch {
    pub coord: [SeqCoord; 2],
    pub num_diff: i32,
}

impl OverlapMatch {
    #[inline]
    pub fn min_overlap_length(&self) -> usize {
        self.coord[0].len().min(self.coord[1].len())
    }
}

/// 有界编辑距离 DP：在长度窗口 [min_overlap, upper_bound] 与误差率上限内，
/// 判定 s1 的某个后缀能否与 s2 的某个前缀构成真实重叠。
/// 可行解中偏好最长重叠，其次取最少编辑数；无可行解返回 None（非错误）。
pub fn bounded_overlap_dp(
    s1: &[u8],
    s2: &[u8],
    min_overlap: usize,
    upper_bound: usize,
    max_error_rate: f64,
) -> Option<OverlapMatch> {
    let u = upper_bound.min(s1.len());
    let v = upper_bound.min(s2.len());
    if min_overlap == 0 || u < min_overlap || v < min_overlap {
        return None;
    }

    let x = &s1[s1.len() - u..];
    let y = &s2[..v];

    let cols = v + 1;
    let size = (u + 1) * cols;
    // d: 编辑数；st: 取得该值的 x 起始行（s1 侧自由起点）
    let mut d = vec![0i32; size];
    let mut st = vec![0usize; size];
    for i in 0..=u {
        d[i * cols] = 0;
        st[i * cols] = i;
    }
    for j in 0..=v {
        d[j] = j as i32;
        st[j] = 0;
    }

    for i in 1..=u {
        for j in 1..=v {
            let idx = i * cols + j;
            let diag = (i - 1) * cols + (j - 1);
            let up = (i - 1) * cols + j;
            let left = i * cols + (j - 1);

            let sub = d[diag] + if x[i - 1] == y[j - 1] { 0 } else { 1 };
            let del = d[up] + 1;
            let ins = d[left] + 1;

            // 平手时偏向对角线，保持起点信息最贴近无间隙对齐
            if sub <= del && sub <= ins {
                d[idx] = sub;
                st[idx] = st[diag];
            } else if del <= ins {
                d[idx] = del;
                st[idx] = st[up];
            } else {
                d[idx] = ins;
                st[idx] = st[left];
            }
        }
    }

    // 候选：对齐区域必须抵达 s1 末端（第 u 行），s2 侧长度 j 自由
    let mut best: Option<(usize, i32, usize, usize)> = None; // (min_len, diffs, la, lb)
    for j in min_overlap..=v {
        let idx = u * cols + j;
        let diffs = d[idx];
        let la = u - st[idx];
        let lb = j;
        if la < min_overlap {
            continue;
        }
        let min_len = la.min(lb);
        if diffs as f64 > max_error_rate * min_len as f64 {
            continue;
        }
        let better = match best {
            None => true,
            Some((bl, bd, _, _)) => min_len > bl || (min_len == bl && diffs < bd),
        };
        if better {
            best = Some((min_len, diffs, la, lb));
        }
    }

    let (_, diffs, la, lb) = best?;
    Some(OverlapMatch {
        coord: [
            SeqCoord {
                start: s1.len() - la,
                end: s1.len() - 1,
                seq_len: s1.len(),
            },
            SeqCoord {
                start: 0,
                end: lb - 1,
                seq_len: s2.len(),
            },
        ],
        num_diff: diffs,
    })
}
