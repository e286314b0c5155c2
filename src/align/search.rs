use std::collections::{HashMap, HashSet, VecDeque};

use crate::index::fm::IndexPair;
use crate::index::interval::{self, Interval, IntervalPair};

/// 扩展方向：Left 为前插（向查询串左端推进），Right 为追加。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendDirection {
    Left,
    Right,
}

/// 回溯搜索中的部分匹配状态。
/// 窗口 [left, right]（双闭）落在查询串坐标上，len = right - left + 1；
/// len < seed_len 时该帧仍是种子，只允许精确扩展。
#[derive(Debug, Clone)]
pub struct SearchFrame {
    pub left: i64,
    pub right: i64,
    pub seed_len: i64,
    pub dir: ExtendDirection,
    pub z: i32,
    pub ranges: IntervalPair,
}

impl SearchFrame {
    #[inline]
    pub fn len(&self) -> i64 {
        self.right - self.left + 1
    }

    #[inline]
    pub fn is_seed(&self) -> bool {
        self.len() < self.seed_len
    }
}

/// 搜索参数。max_frames 限定单次查询允许入队的帧总数，超限即放弃该查询
/// （召回率换可控耗时）；verify 打开冗余键一致性检查。
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub max_frames: usize,
    pub seed_len: usize,
    pub verify: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_frames: 100_000,
            seed_len: 0,
            verify: false,
        }
    }
}

/// 一次被接受的出现：正向索引上的秩区间、查询窗口与累计编辑数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub interval: Interval,
    pub query_start: usize,
    pub query_end: usize,
    pub num_diff: i32,
}

/// 冗余判定的规范键：前导区间加匹配长度。键相同的两帧可互换，留一即可。
#[inline]
fn redundancy_key(frame: &SearchFrame) -> (i64, i64, i64) {
    (
        frame.ranges.fwd.lower,
        frame.ranges.fwd.upper,
        frame.len(),
    )
}

#[derive(Debug, Clone, Copy)]
enum Budget {
    MaxDiff(i32),
    ErrorRate(f64),
}

impl Budget {
    // 当前匹配长度下允许的编辑数，误差率预算随长度增长重算
    #[inline]
    fn allowed(&self, len: i64) -> i32 {
        match *self {
            Budget::MaxDiff(d) => d,
            Budget::ErrorRate(r) => (r * len as f64).floor() as i32,
        }
    }
}

/// 固定编辑预算的近似搜索（仅替换）。查询须已按字母表编码。
/// 命中追加到 hits，返回追加条数。
pub fn align_suffix_max_diff(
    w: &[u8],
    idx: &IndexPair,
    max_diff: i32,
    min_overlap: i32,
    params: &SearchParams,
    hits: &mut Vec<Hit>,
) -> usize {
    run_search(
        w,
        idx,
        ExtendDirection::Left,
        Budget::MaxDiff(max_diff),
        min_overlap,
        false,
        true,
        params,
        hits,
    )
}

/// 误差率驱动的近似搜索：预算 = floor(error_rate × 当前长度)，随匹配
/// 增长重算；替换 / 插入 / 删除均记一次编辑。
pub fn align_suffix_inexact(
    w: &[u8],
    idx: &IndexPair,
    error_rate: f64,
    min_overlap: i32,
    params: &SearchParams,
    hits: &mut Vec<Hit>,
) -> usize {
    run_search(
        w,
        idx,
        ExtendDirection::Left,
        Budget::ErrorRate(error_rate),
        min_overlap,
        true,
        true,
        params,
        hits,
    )
}

/// 穷举版本：关闭冗余裁剪，仅用于正确性校验。
pub fn align_suffix_inexact_exhaustive(
    w: &[u8],
    idx: &IndexPair,
    error_rate: f64,
    min_overlap: i32,
    params: &SearchParams,
    hits: &mut Vec<Hit>,
) -> usize {
    run_search(
        w,
        idx,
        ExtendDirection::Left,
        Budget::ErrorRate(error_rate),
        min_overlap,
        true,
        false,
        params,
        hits,
    )
}

/// 追加方向的固定预算搜索，经由区间对技巧在反向索引上推进。
pub fn align_prefix_max_diff(
    w: &[u8],
    idx: &IndexPair,
    max_diff: i32,
    min_overlap: i32,
    params: &SearchParams,
    hits: &mut Vec<Hit>,
) -> usize {
    run_search(
        w,
        idx,
        ExtendDirection::Right,
        Budget::MaxDiff(max_diff),
        min_overlap,
        false,
        true,
        params,
        hits,
    )
}

fn run_search(
    w: &[u8],
    idx: &IndexPair,
    dir: ExtendDirection,
    budget: Budget,
    min_overlap: i32,
    allow_indels: bool,
    prune: bool,
    params: &SearchParams,
    hits: &mut Vec<Hit>,
) -> usize {
    // 退化输入一律零命中，不是错误
    if w.is_empty() || min_overlap <= 0 || idx.fwd.is_empty() {
        return 0;
    }
    let n = w.len() as i64;

    let root = SearchFrame {
        left: if dir == ExtendDirection::Left { n } else { 0 },
        right: if dir == ExtendDirection::Left { n - 1 } else { -1 },
        seed_len: params.seed_len as i64,
        dir,
        z: 0,
        ranges: IntervalPair::full(&idx.fwd, &idx.rev),
    };

    let mut queue: VecDeque<SearchFrame> = VecDeque::new();
    let mut seen: HashSet<(i64, i64, i64)> = HashSet::new();
    let mut verify_map: HashMap<(i64, i64, i64), i32> = HashMap::new();
    let mut out: Vec<Hit> = Vec::new();
    let mut created = 1usize;
    queue.push_back(root);

    while let Some(frame) = queue.pop_front() {
        let exhausted = match frame.dir {
            ExtendDirection::Left => frame.left == 0,
            ExtendDirection::Right => frame.right == n - 1,
        };
        if exhausted {
            if frame.len() >= min_overlap as i64 && frame.z <= budget.allowed(frame.len()) {
                out.push(Hit {
                    interval: frame.ranges.fwd,
                    query_start: frame.left as usize,
                    query_end: frame.right as usize,
                    num_diff: frame.z,
                });
            }
            continue;
        }

        let qpos = match frame.dir {
            ExtendDirection::Left => frame.left - 1,
            ExtendDirection::Right => frame.right + 1,
        };
        let expected = w[qpos as usize];

        let mut children: Vec<SearchFrame> = Vec::new();

        // 替换 / 精确扩展：逐符号尝试 {A,C,G,T}
        for c in 1u8..5 {
            let is_match = c == expected;
            if frame.is_seed() && !is_match {
                continue;
            }
            let z = frame.z + if is_match { 0 } else { 1 };
            if z > budget.allowed(frame.len() + 1) {
                continue;
            }
            let mut ranges = frame.ranges;
            match frame.dir {
                ExtendDirection::Left => interval::extend_prepend(&mut ranges, c, &idx.fwd),
                ExtendDirection::Right => interval::extend_append(&mut ranges, c, &idx.rev),
            }
            if !ranges.fwd.is_valid() {
                continue;
            }
            let (left, right) = match frame.dir {
                ExtendDirection::Left => (frame.left - 1, frame.right),
                ExtendDirection::Right => (frame.left, frame.right + 1),
            };
            children.push(SearchFrame {
                left,
                right,
                ranges,
                z,
                ..frame
            });
        }

        if allow_indels && !frame.is_seed() && frame.len() > 0 {
            // 插入：消耗一个查询位置而区间不动
            let z = frame.z + 1;
            if z <= budget.allowed(frame.len() + 1) {
                let (left, right) = match frame.dir {
                    ExtendDirection::Left => (frame.left - 1, frame.right),
                    ExtendDirection::Right => (frame.left, frame.right + 1),
                };
                children.push(SearchFrame {
                    left,
                    right,
                    z,
                    ..frame
                });
            }
            // 删除：区间吃掉一个文本符号而窗口不动
            if z <= budget.allowed(frame.len()) {
                for c in 1u8..5 {
                    let mut ranges = frame.ranges;
                    match frame.dir {
                        ExtendDirection::Left => {
                            interval::extend_prepend(&mut ranges, c, &idx.fwd)
                        }
                        ExtendDirection::Right => {
                            interval::extend_append(&mut ranges, c, &idx.rev)
                        }
                    }
                    if !ranges.fwd.is_valid() {
                        continue;
                    }
                    children.push(SearchFrame {
                        ranges,
                        z,
                        ..frame
                    });
                }
            }
        }

        for child in children {
            created += 1;
            if created > params.max_frames {
                // 搜索空间超限：放弃整个查询，按零命中处理
                return 0;
            }
            // 一致性检查：同键帧可互换，仅替换搜索下编辑数也必然相等
            if params.verify && !allow_indels {
                if let Some(&z0) = verify_map.get(&redundancy_key(&child)) {
                    assert_eq!(z0, child.z, "redundant frames must carry equal edit count");
                } else {
                    verify_map.insert(redundancy_key(&child), child.z);
                }
            }
            if prune && !seen.insert(redundancy_key(&child)) {
                continue;
            }
            queue.push_back(child);
        }
    }

    let added = out.len();
    hits.extend(out);
    added
}
