//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use flate2::bufread::MultiGzDecoder;

use crate::err::Error;

/// Transparently open a file with gzip decoder.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead + Send>, Error>
where
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).map_err(|e| Error::unavailable(path.as_ref(), e))?;
    if path.as_ref().extension().map(|s| s.to_str()) == Some(Some("gz")) {
        tracing::trace!("Opening {:?} as gzip for reading", path.as_ref());
        let decoder = MultiGzDecoder::new(BufReader::new(file));
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        tracing::trace!("Opening {:?} as plain text for reading", path.as_ref());
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read a tab-separated file with header into records of type `R`.
pub fn read_tsv<R, P>(path: P) -> Result<Vec<R>, Error>
where
    R: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .from_reader(open_read_maybe_gz(path.as_ref())?);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record.map_err(|e| Error::unavailable(path.as_ref(), e))?);
    }
    Ok(records)
}

/// Expand the input path arguments.
///
/// Arguments starting with `@` name a file with one path per line.  Directories
/// are replaced by the files in them whose name ends with one of `suffixes`.
/// The result is sorted lexicographically.
pub fn expand_input_paths(args: &[String], suffixes: &[&str]) -> Result<Vec<PathBuf>, Error> {
    let mut result = Vec::new();
    for arg in args {
        if let Some(list_path) = arg.strip_prefix('@') {
            let contents = std::fs::read_to_string(list_path)
                .map_err(|e| Error::unavailable(list_path, e))?;
            result.extend(
                contents
                    .lines()
                    .map(|line| line.trim())
                    .filter(|line| !line.is_empty())
                    .map(PathBuf::from),
            );
        } else if Path::new(arg).is_dir() {
            for entry in std::fs::read_dir(arg).map_err(|e| Error::unavailable(arg, e))? {
                let path = entry.map_err(|e| Error::unavailable(arg, e))?.path();
                let name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or_default();
                if suffixes.iter().any(|suffix| name.ends_with(suffix)) {
                    result.push(path);
                }
            }
        } else {
            result.push(PathBuf::from(arg));
        }
    }
    result.sort();
    Ok(result)
}

#[cfg(test)]
mod test {
    use std::io::{BufRead, Write};

    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case(true)]
    #[case(false)]
    fn open_read_maybe_gz(#[case] is_gzip: bool) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join(if is_gzip { "test.txt.gz" } else { "test.txt" });
        {
            let file = std::fs::File::create(&path)?;
            if is_gzip {
                let mut encoder =
                    flate2::write::GzEncoder::new(file, flate2::Compression::default());
                encoder.write_all(b"line 1\nline 2\n")?;
                encoder.finish()?;
            } else {
                let mut file = file;
                file.write_all(b"line 1\nline 2\n")?;
            }
        }

        let lines = super::open_read_maybe_gz(&path)?
            .lines()
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(lines, vec!["line 1", "line 2"]);
        Ok(())
    }

    #[test]
    fn open_read_missing_file() {
        let Err(err) = super::open_read_maybe_gz("tests/mito/does-not-exist.tsv") else {
            panic!("opening a missing file must fail");
        };
        assert_eq!(err.scope(), crate::err::Scope::Process);
    }

    #[test]
    fn expand_input_paths_dir_and_list() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let vcf_dir = tmp_dir.join("vcfs");
        std::fs::create_dir(&vcf_dir)?;
        for name in ["b.anno.vcf", "a.anno.vcf", "c.vcf", "d.anno.vcf.gz"] {
            std::fs::write(vcf_dir.join(name), "")?;
        }
        let list = tmp_dir.join("list.txt");
        std::fs::write(
            &list,
            format!(
                "{}\n\n{}\n",
                tmp_dir.join("z.anno.vcf").display(),
                tmp_dir.join("y.anno.vcf").display()
            ),
        )?;

        let paths = super::expand_input_paths(
            &[
                vcf_dir.display().to_string(),
                format!("@{}", list.display()),
            ],
            &[".anno.vcf", ".anno.vcf.gz"],
        )?;

        assert_eq!(
            paths,
            vec![
                vcf_dir.join("a.anno.vcf"),
                vcf_dir.join("b.anno.vcf"),
                vcf_dir.join("d.anno.vcf.gz"),
                tmp_dir.join("y.anno.vcf"),
                tmp_dir.join("z.anno.vcf"),
            ]
        );
        Ok(())
    }
}
