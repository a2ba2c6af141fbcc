use anyhow::{Context, Result, bail};
use skydb_core::{
    EntryLink, Link,
    link::{self, PathMode},
};

use crate::LinkCmd;
use crate::helpers::{parse_data_key, parse_public_key};

pub fn run_link(cmd: LinkCmd) -> Result<()> {
    match cmd {
        LinkCmd::Parse {
            input,
            include_path,
            only_path,
        } => {
            let mode = match (include_path, only_path) {
                (true, _) => PathMode::IncludePath,
                (_, true) => PathMode::OnlyPath,
                _ => PathMode::LinkOnly,
            };
            match link::parse_as(&input, mode).context("malformed link")? {
                Some(selected) => println!("{selected}"),
                None => bail!("no link found in {input:?}"),
            }
        }
        LinkCmd::Decode { link } => {
            let raw = link::decode(&link).context("failed to decode link")?;
            let parsed = Link::from_bytes(&raw)?;
            match parsed {
                Link::Content(content) => {
                    println!("type:     content");
                    println!("bitfield: {:#06x}", content.bitfield());
                    println!("hash:     {}", content.hash());
                }
                Link::Entry(entry) => {
                    println!("type:       entry");
                    println!("public key: {}", entry.public_key());
                    println!("data key:   {}", entry.data_key());
                }
            }
            println!("raw:      {}", hex::encode(&raw));
            println!("base64:   {}", parsed.to_base64());
            println!("base32:   {}", parsed.to_base32());
        }
        LinkCmd::Entry {
            public_key,
            data_key,
            hashed,
        } => {
            let public_key = parse_public_key(&public_key)?;
            let data_key = parse_data_key(&data_key, hashed)?;
            println!("{}", EntryLink::new(public_key, &data_key));
        }
    }
    Ok(())
}
