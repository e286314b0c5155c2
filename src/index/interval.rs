use std::cmp::Ordering;

use crate::index::fm::FmIndex;

/// 压缩索引上的秩区间 [lower, upper]，双闭。
/// lower > upper 表示当前模式串在文本中零次出现。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub lower: i64,
    pub upper: i64,
}

impl Interval {
    #[inline]
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn invalid() -> Self {
        Self { lower: 0, upper: -1 }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lower <= self.upper
    }

    /// 区间宽度（占有数）；无效区间为 0。
    #[inline]
    pub fn size(&self) -> i64 {
        if self.is_valid() {
            self.upper - self.lower + 1
        } else {
            0
        }
    }

    /// 先比较 lower 再比较 upper 的全序，冗余裁剪的规范键。
    #[inline]
    pub fn cmp_by_bounds(a: &Interval, b: &Interval) -> Ordering {
        a.lower.cmp(&b.lower).then(a.upper.cmp(&b.upper))
    }
}

/// 区间对：fwd 追踪模式串 S 在正向索引上的区间，
/// rev 追踪 reverse(S) 在反转文本索引上的区间。
/// 两半联动后可在不回看原文的情况下向任一方向扩展。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalPair {
    pub fwd: Interval,
    pub rev: Interval,
}

impl IntervalPair {
    /// 单符号 c 已匹配的初始区间对。
    pub fn init(c: u8, fwd: &FmIndex, rev: &FmIndex) -> Self {
        let fl = fwd.count(c);
        let fu = fl + fwd.rank(c, fwd.len() - 1) - 1;
        let rl = rev.count(c);
        let ru = rl + rev.rank(c, rev.len() - 1) - 1;
        Self {
            fwd: Interval::new(fl, fu),
            rev: Interval::new(rl, ru),
        }
    }

    /// “零符号已匹配”哨兵：两半覆盖整个索引。
    pub fn full(fwd: &FmIndex, rev: &FmIndex) -> Self {
        Self {
            fwd: Interval::new(0, fwd.len() - 1),
            rev: Interval::new(0, rev.len() - 1),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.fwd.is_valid() && self.rev.is_valid()
    }
}

/// 追加扩展：S → S·c。
/// fwd 半由 rev 半上的 rank 差分推进（区间对技巧，免去第二次独立回溯）；
/// rev 半按标准回溯算术直接推进。要求传入反转文本的索引。
/// 前置条件：pair 有效（或为 full 哨兵）。
pub fn extend_append(pair: &mut IntervalPair, c: u8, rev: &FmIndex) {
    let diff = rev.rank_diff(pair.rev.lower - 1, pair.rev.upper);
    pair.fwd.lower += diff.less_than(c);
    pair.fwd.upper = pair.fwd.lower + diff.get(c) - 1;

    let pb = rev.count(c);
    let old_lower = pair.rev.lower;
    pair.rev.lower = pb + rev.rank(c, old_lower - 1);
    pair.rev.upper = pb + rev.rank(c, pair.rev.upper) - 1;
}

/// 前插扩展：S → c·S。只动 fwd 半，rev 半随即失效（保持原值不再可用）。
/// 前置条件：pair 的 fwd 半有效（或为 full 哨兵）。
pub fn extend_prepend(pair: &mut IntervalPair, c: u8, fwd: &FmIndex) {
    let pb = fwd.count(c);
    let lower = pb + fwd.rank(c, pair.fwd.lower - 1);
    let upper = pb + fwd.rank(c, pair.fwd.upper) - 1;
    pair.fwd = Interval::new(lower, upper);
}
