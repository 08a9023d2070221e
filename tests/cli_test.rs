use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::io::Read;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn sample_text() -> Vec<u8> {
    let line = "To be, or not to be, that is the question:\r\n";
    line.repeat(400).into_bytes()
}

fn decode(format: &str,buf: &[u8]) -> Vec<u8> {
    let mut ans = Vec::new();
    match format {
        "gzip" => flate2::read::GzDecoder::new(buf).read_to_end(&mut ans).expect("bad gzip"),
        "zlib" => flate2::read::ZlibDecoder::new(buf).read_to_end(&mut ans).expect("bad zlib"),
        _ => flate2::read::DeflateDecoder::new(buf).read_to_end(&mut ans).expect("bad deflate")
    };
    ans
}

fn compress_test(format: &str,extra: &[&str]) -> STDRESULT {
    let mut cmd = Command::cargo_bin("squeezer")?;
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let out_path = temp_dir.path().join("sample.out");
    let txt = sample_text();
    std::fs::write(&in_path,&txt)?;
    cmd.arg("compress")
        .arg("-f").arg(format)
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .args(extra)
        .assert()
        .success()
        .stderr(predicate::str::contains(format!("compressed {} into",txt.len())));
    let compressed = std::fs::read(out_path)?;
    if extra.is_empty() {
        assert!(compressed.len() < txt.len());
    }
    assert_eq!(decode(format,&compressed),txt);
    Ok(())
}

fn png_file() -> Vec<u8> {
    fn chunk(out: &mut Vec<u8>,name: &[u8],data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let mut crc = flate2::Crc::new();
        crc.update(name);
        crc.update(data);
        out.extend_from_slice(name);
        out.extend_from_slice(data);
        out.extend_from_slice(&crc.sum().to_be_bytes());
    }
    let mut raw = Vec::new();
    for row in 0..32u8 {
        raw.push(0);
        raw.extend((0..32u8).map(|x| (x ^ row) & 0xf8));
    }
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(),flate2::Compression::none());
    std::io::Write::write_all(&mut enc,&raw).expect("zlib");
    let zdata = enc.finish().expect("zlib");
    let mut ans = vec![0x89,b'P',b'N',b'G',0x0d,0x0a,0x1a,0x0a];
    chunk(&mut ans,b"IHDR",&[0,0,0,32,0,0,0,32,8,0,0,0,0]);
    chunk(&mut ans,b"tEXt",b"Author\0nobody");
    chunk(&mut ans,b"IDAT",&zdata);
    chunk(&mut ans,b"IEND",&[]);
    ans
}

#[test]
fn gzip_compression() -> STDRESULT {
    compress_test("gzip",&[])?;
    compress_test("gzip",&["-b","fixed","--cache-size","1000","--immediate"])
}

#[test]
fn zlib_compression() -> STDRESULT {
    compress_test("zlib",&[])?;
    compress_test("zlib",&["-n","5","--cache-size","0"])
}

#[test]
fn deflate_compression() -> STDRESULT {
    compress_test("deflate",&["-b","stored"])?;
    compress_test("deflate",&["-b","dynamic","--cache-size","4096"])
}

#[test]
fn checksums() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("digits.txt");
    std::fs::write(&in_path,b"123456789")?;
    Command::cargo_bin("squeezer")?
        .arg("checksum").arg("-a").arg("crc32").arg("-i").arg(&in_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("cbf43926"));
    Command::cargo_bin("squeezer")?
        .arg("checksum").arg("-a").arg("adler32").arg("-i").arg(&in_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("091e01de"));
    Ok(())
}

#[test]
fn png_optimization() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.png");
    let out_path = temp_dir.path().join("out.png");
    let orig = png_file();
    std::fs::write(&in_path,&orig)?;
    Command::cargo_bin("squeezer")?
        .arg("png").arg("-i").arg(&in_path).arg("-o").arg(&out_path)
        .arg("--keep-chunks").arg("tEXt")
        .assert()
        .success();
    let ans = std::fs::read(&out_path)?;
    assert!(ans.len() < orig.len());
    assert_eq!(&ans[0..8],&orig[0..8]);
    assert!(ans.windows(4).any(|w| w==b"tEXt"));
    Ok(())
}

#[test]
fn png_bad_signature() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.png");
    let out_path = temp_dir.path().join("out.png");
    let mut orig = png_file();
    orig[3] = b'X';
    std::fs::write(&in_path,&orig)?;
    Command::cargo_bin("squeezer")?
        .arg("png").arg("-i").arg(&in_path).arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("incorrect PNG signature"));
    Ok(())
}
