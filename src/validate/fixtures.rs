use std::fs;
use std::path::{Path, PathBuf};

pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// `bagit.txt`, an empty `data/` and an empty `manifest-md5.txt`.
pub fn minimal_bag(root: &Path) {
    fs::create_dir_all(root.join("data")).unwrap();
    write_file(
        &root.join("bagit.txt"),
        b"BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n",
    );
    write_file(&root.join("manifest-md5.txt"), b"");
}

pub fn ohms_xml(date: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ROOT xmlns="https://www.weareavp.com/nunncenter/ohms">
  <record id="0001" dt="2020-03-01">
    <title>Interview with a river pilot</title>
    <accession>oh123</accession>
    <date value="{date}">{date}</date>
    <series_name>River Lives</series_name>
    <repository>University Archives</repository>
    <interviewee>Jane Doe</interviewee>
    <interviewer>John Roe</interviewer>
    <subject>Rivers</subject>
    <clip_format>audio</clip_format>
    <description>Recollections of river work.</description>
  </record>
</ROOT>
"#
    )
}

/// A package named `name` under `parent` that passes every default check.
pub fn valid_sip(parent: &Path, name: &str) -> PathBuf {
    let sip = parent.join(name);
    minimal_bag(&sip);
    write_file(
        &sip.join("data").join(format!("{name}_ohm.xml")),
        ohms_xml("2020-02-29").as_bytes(),
    );
    sip
}

/// An invalid package: bag markers missing.
pub fn broken_sip(parent: &Path, name: &str) -> PathBuf {
    let sip = valid_sip(parent, name);
    fs::remove_file(sip.join("bagit.txt")).unwrap();
    sip
}

/// A batch bag at `root` with packages under `data/sips`.
pub fn batch_with(root: &Path, valid: &[&str], broken: &[&str]) -> PathBuf {
    minimal_bag(root);
    let sips = root.join("data").join("sips");
    fs::create_dir_all(&sips).unwrap();
    for name in valid {
        valid_sip(&sips, name);
    }
    for name in broken {
        broken_sip(&sips, name);
    }
    sips
}
