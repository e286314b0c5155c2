use anyhow::{anyhow, Result};

use crate::align::overlap;
use crate::scaffold::record::{LinkDir, Orientation, ScaffoldRecord};
use crate::scaffold::store::SequenceStore;
use crate::util::dna;

/// 重叠未确认时插入的固定间隙长度。
const FALLBACK_GAP: usize = 10;

/// 脚手架物化参数。max_overlap 缺省时按链接的
/// expected + 3·stdDev 推导重叠搜索上界。
#[derive(Debug, Clone)]
pub struct ScaffoldOpt {
    pub no_overlap: bool,
    pub min_overlap: usize,
    pub max_overlap: Option<usize>,
    pub max_error_rate: f64,
}

impl Default for ScaffoldOpt {
    fn default() -> Self {
        Self {
            no_overlap: false,
            min_overlap: 20,
            max_overlap: None,
            max_error_rate: 0.05,
        }
    }
}

/// 把一条脚手架记录物化为共识序列。
///
/// 根或端点 id 未知对本记录是致命错误；重叠解析失败只会触发
/// 间隙回退。若首条链接朝反义方向生长，则进入反向工作模式：
/// 先反转在建共识，使后续步骤一律向右追加，收尾再整体反转一次。
pub fn generate_sequence(
    record: &ScaffoldRecord,
    store: &SequenceStore,
    opt: &ScaffoldOpt,
) -> Result<Vec<u8>> {
    let root = store
        .lookup(&record.root_id)
        .ok_or_else(|| anyhow!("unknown root sequence id '{}'", record.root_id))?;
    let mut sequence = root.to_vec();

    if record.links.is_empty() {
        return Ok(sequence);
    }

    let reverse_all = record.links[0].dir == LinkDir::Antisense;
    if reverse_all {
        sequence = dna::reverse(&sequence);
    }

    let mut curr = Orientation::Same;
    for link in &record.links {
        let target = store
            .lookup(&link.endpoint_id)
            .ok_or_else(|| anyhow!("unknown endpoint sequence id '{}'", link.endpoint_id))?;

        // 相对根的有效方向按遍历顺序 XOR 累积
        curr = curr ^ link.orientation;

        let mut to_append = if curr == Orientation::Reverse {
            dna::revcomp(target)
        } else {
            target.to_vec()
        };
        if reverse_all {
            to_append = dna::reverse(&to_append);
        }

        if link.distance < 0 {
            // 期望重叠 -distance：先尝试解析真实重叠
            let expected = (-link.distance) as usize;
            let mut overlap_found = false;
            if !opt.no_overlap {
                let upper = opt
                    .max_overlap
                    .unwrap_or(expected + (3.0 * link.std_dev) as usize);
                if let Some(m) = overlap::bounded_overlap_dp(
                    &sequence,
                    &to_append,
                    opt.min_overlap,
                    upper,
                    opt.max_error_rate,
                ) {
                    let overhang = m.coord[1].complement();
                    sequence.extend_from_slice(overhang.substring(&to_append));
                    overlap_found = true;
                }
            }
            if !overlap_found {
                // 回退：按估计重叠截断片段，前置固定间隙
                sequence.extend(std::iter::repeat(dna::GAP_BASE).take(FALLBACK_GAP));
                sequence.extend_from_slice(&to_append[expected.min(to_append.len())..]);
            }
        } else {
            sequence.extend(std::iter::repeat(dna::GAP_BASE).take(link.distance as usize));
            sequence.extend_from_slice(&to_append);
        }
    }

    if reverse_all {
        sequence = dna::reverse(&sequence);
    }
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::record::ScaffoldLink;

    fn store_of(entries: &[(&str, &[u8])]) -> SequenceStore {
        let mut store = SequenceStore::new();
        for (id, seq) in entries {
            store.insert(id, seq.to_vec());
        }
        store
    }

    fn link(id: &str, dir: LinkDir, orientation: Orientation, distance: i64) -> ScaffoldLink {
        ScaffoldLink {
            endpoint_id: id.to_string(),
            dir,
            orientation,
            distance,
            std_dev: 0.0,
        }
    }

    fn opt(min_overlap: usize, rate: f64) -> ScaffoldOpt {
        ScaffoldOpt {
            no_overlap: false,
            min_overlap,
            max_overlap: None,
            max_error_rate: rate,
        }
    }

    #[test]
    fn overlap_join_merges_once() {
        let store = store_of(&[("r", b"AAAACCCC"), ("e", b"CCCCGGGG")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e", LinkDir::Sense, Orientation::Same, -4));
        let seq = generate_sequence(&rec, &store, &opt(3, 0.0)).unwrap();
        assert_eq!(seq, b"AAAACCCCGGGG".to_vec());
    }

    #[test]
    fn gap_join_inserts_fillers() {
        let store = store_of(&[("r", b"AAAACCCC"), ("e", b"CCCCGGGG")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e", LinkDir::Sense, Orientation::Same, 3));
        let seq = generate_sequence(&rec, &store, &opt(3, 0.0)).unwrap();
        assert_eq!(seq, b"AAAACCCCNNNCCCCGGGG".to_vec());
    }

    #[test]
    fn reverse_orientation_flips_endpoint() {
        let store = store_of(&[("r", b"TTTT"), ("e", b"AAGGTT")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e", LinkDir::Sense, Orientation::Reverse, 0));
        let seq = generate_sequence(&rec, &store, &opt(3, 0.0)).unwrap();
        assert_eq!(seq, b"TTTTAACCTT".to_vec());
    }

    #[test]
    fn orientation_accumulates_by_xor() {
        // 两次 Reverse 相消：第二个端点按原样追加
        let store = store_of(&[("r", b"AAAA"), ("e1", b"CCCC"), ("e2", b"TTAA")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e1", LinkDir::Sense, Orientation::Reverse, 0));
        rec.add_link(link("e2", LinkDir::Sense, Orientation::Reverse, 0));
        let seq = generate_sequence(&rec, &store, &opt(3, 0.0)).unwrap();
        assert_eq!(seq, b"AAAAGGGGTTAA".to_vec());
    }

    #[test]
    fn failed_overlap_falls_back_to_gap_and_trim() {
        // 端点前缀与共识尾部不符：解析失败，插 10 个 N 并按估计截断
        let store = store_of(&[("r", b"AAAACCCC"), ("e", b"TTTTGGGG")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e", LinkDir::Sense, Orientation::Same, -4));
        let seq = generate_sequence(&rec, &store, &opt(3, 0.0)).unwrap();
        assert_eq!(seq, b"AAAACCCCNNNNNNNNNNGGGG".to_vec());
    }

    #[test]
    fn no_overlap_mode_skips_resolution() {
        let store = store_of(&[("r", b"AAAACCCC"), ("e", b"CCCCGGGG")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e", LinkDir::Sense, Orientation::Same, -4));
        let mut o = opt(3, 0.0);
        o.no_overlap = true;
        let seq = generate_sequence(&rec, &store, &o).unwrap();
        assert_eq!(seq, b"AAAACCCCNNNNNNNNNNGGGG".to_vec());
    }

    #[test]
    fn estimated_trim_saturates_at_target_length() {
        let store = store_of(&[("r", b"AAAACCCC"), ("e", b"GGGG")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e", LinkDir::Sense, Orientation::Same, -9));
        let mut o = opt(3, 0.0);
        o.no_overlap = true;
        let seq = generate_sequence(&rec, &store, &o).unwrap();
        assert_eq!(seq, b"AAAACCCCNNNNNNNNNN".to_vec());
    }

    #[test]
    fn antisense_first_link_grows_leftward() {
        let store = store_of(&[("r", b"ACGT"), ("e", b"GGCC")]);
        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("e", LinkDir::Antisense, Orientation::Same, 2));
        let seq = generate_sequence(&rec, &store, &opt(3, 0.0)).unwrap();
        assert_eq!(seq, b"GGCCNNACGT".to_vec());
    }

    #[test]
    fn unknown_ids_are_fatal_for_the_record() {
        let store = store_of(&[("r", b"ACGT")]);
        assert!(generate_sequence(&ScaffoldRecord::new("missing"), &store, &opt(3, 0.0)).is_err());

        let mut rec = ScaffoldRecord::new("r");
        rec.add_link(link("missing", LinkDir::Sense, Orientation::Same, 0));
        assert!(generate_sequence(&rec, &store, &opt(3, 0.0)).is_err());
    }

    #[test]
    fn root_only_record_returns_root() {
        let store = store_of(&[("r", b"ACGTACGT")]);
        let seq = generate_sequence(&ScaffoldRecord::new("r"), &store, &opt(3, 0.0)).unwrap();
        assert_eq!(seq, b"ACGTACGT".to_vec());
    }

    #[test]
    fn inverted_record_yields_reverse_complement() {
        // 正向装配 vs 根取反向互补、每条链接方向与走向同时取反：
        // 两个共识互为反向互补
        let r = b"ACGTAC";
        let t = b"GGATCA";
        let fwd_store = store_of(&[("r", r), ("e", t)]);
        let mut fwd_rec = ScaffoldRecord::new("r");
        fwd_rec.add_link(link("e", LinkDir::Sense, Orientation::Same, 3));
        let fwd = generate_sequence(&fwd_rec, &fwd_store, &opt(3, 0.0)).unwrap();

        let inv_store = store_of(&[("r", &dna::revcomp(r)), ("e", t)]);
        let mut inv_rec = ScaffoldRecord::new("r");
        inv_rec.add_link(link("e", LinkDir::Antisense, Orientation::Reverse, 3));
        let inv = generate_sequence(&inv_rec, &inv_store, &opt(3, 0.0)).unwrap();

        assert_eq!(inv, dna::revcomp(&fwd));
    }
}
