use std::fmt;

use anyhow::{anyhow, bail, Result};

/// 相对根的链走向。组合规则为 XOR：两次 Reverse 相消。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Same,
    Reverse,
}

impl std::ops::BitXor for Orientation {
    type Output = Orientation;

    fn bitxor(self, rhs: Orientation) -> Orientation {
        if self == rhs {
            Orientation::Same
        } else {
            Orientation::Reverse
        }
    }
}

/// 脚手架生长方向：正义向右追加，反义向左生长。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDir {
    Sense,
    Antisense,
}

/// 脚手架中的一条链接。distance < 0 表示期望 -distance 长度的重叠，
/// 非负表示显式间隙碱基数；std_dev 是距离估计的标准差。
#[derive(Debug, Clone, PartialEq)]
pub struct ScaffoldLink {
    pub endpoint_id: String,
    pub dir: LinkDir,
    pub orientation: Orientation,
    pub distance: i64,
    pub std_dev: f64,
}

impl ScaffoldLink {
    /// 链接子格式：`endpoint,distance,stdDev,dir,comp`，
    /// dir 0=正义 1=反义，comp 0=同向 1=反向。
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != 5 {
            bail!(
                "scaffold link needs 5 comma-separated fields, got {} in '{}'",
                fields.len(),
                text
            );
        }
        if fields[0].is_empty() {
            bail!("scaffold link has empty endpoint id in '{}'", text);
        }
        let distance: i64 = fields[1]
            .parse()
            .map_err(|_| anyhow!("bad link distance '{}'", fields[1]))?;
        let std_dev: f64 = fields[2]
            .parse()
            .map_err(|_| anyhow!("bad link stdDev '{}'", fields[2]))?;
        let dir = match fields[3] {
            "0" => LinkDir::Sense,
            "1" => LinkDir::Antisense,
            other => bail!("bad link dir flag '{}'", other),
        };
        let orientation = match fields[4] {
            "0" => Orientation::Same,
            "1" => Orientation::Reverse,
            other => bail!("bad link comp flag '{}'", other),
        };
        Ok(Self {
            endpoint_id: fields[0].to_string(),
            dir,
            orientation,
            distance,
            std_dev,
        })
    }
}

impl fmt::Display for ScaffoldLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.dir {
            LinkDir::Sense => 0,
            LinkDir::Antisense => 1,
        };
        let comp = match self.orientation {
            Orientation::Same => 0,
            Orientation::Reverse => 1,
        };
        write!(
            f,
            "{},{},{},{},{}",
            self.endpoint_id, self.distance, self.std_dev, dir, comp
        )
    }
}

/// 一条脚手架记录：根序列 id 加有序链接表，即装配图中的一条线性路径。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaffoldRecord {
    pub root_id: String,
    pub links: Vec<ScaffoldLink>,
}

impl ScaffoldRecord {
    pub fn new(root_id: &str) -> Self {
        Self {
            root_id: root_id.to_string(),
            links: Vec::new(),
        }
    }

    pub fn set_root(&mut self, root_id: &str) {
        self.root_id = root_id.to_string();
    }

    pub fn add_link(&mut self, link: ScaffoldLink) {
        self.links.push(link);
    }

    /// 解析一行制表符分隔的记录：字段 0 为根 id，其余各为一条链接。
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(&['\n', '\r'][..]);
        let mut fields = line.split('\t');
        let root_id = fields.next().unwrap_or("");
        if root_id.is_empty() {
            bail!("empty scaffold record");
        }
        let mut record = Self::new(root_id);
        for f in fields {
            record.links.push(ScaffoldLink::parse(f)?);
        }
        Ok(record)
    }

    /// 写出一行记录，含换行。
    pub fn write_record<W: std::io::Write>(&self, w: &mut W) -> Result<()> {
        write!(w, "{}", self.root_id)?;
        for link in &self.links {
            write!(w, "\t{}", link)?;
        }
        writeln!(w)?;
        Ok(())
    }
}
