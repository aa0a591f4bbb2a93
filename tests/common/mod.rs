#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

pub const MISSION: &str = r#"mission =
{
    ["start_time"] = 43200,
    ["sortie"] = "DictKey_sortie_4",
    ["theatre"] = "Caucasus",
    ["descriptionText"] = "DictKey_descriptionText_1",
    ["descriptionBlueTask"] = "DictKey_descriptionBlueTask_3",
    ["descriptionRedTask"] = "DictKey_descriptionRedTask_2",
    ["groundControl"] =
    {
        ["isPilotControlVehicles"] = false,
        ["roles"] =
        {
            ["artillery_commander"] =
            {
                ["red"] = 0,
                ["blue"] = 0,
            }, -- end of ["artillery_commander"]
            ["instructor"] =
            {
                ["red"] = 0,
                ["blue"] = 0,
            }, -- end of ["instructor"]
            ["observer"] =
            {
                ["red"] = 0,
                ["blue"] = 2,
            }, -- end of ["observer"]
            ["forward_observer"] =
            {
                ["red"] = 0,
                ["blue"] = 0,
            }, -- end of ["forward_observer"]
        }, -- end of ["roles"]
    }, -- end of ["groundControl"]
    ["weather"] =
    {
        ["atmosphere_type"] = 0,
        ["wind"] =
        {
            ["at8000"] =
            {
                ["speed"] = 12,
                ["dir"] = 270,
            }, -- end of ["at8000"]
            ["at2000"] =
            {
                ["speed"] = 8,
                ["dir"] = 260,
            }, -- end of ["at2000"]
            ["atGround"] =
            {
                ["speed"] = 3,
                ["dir"] = 250,
            }, -- end of ["atGround"]
        }, -- end of ["wind"]
        ["enable_fog"] = false,
        ["season"] =
        {
            ["temperature"] = 20,
        }, -- end of ["season"]
        ["qnh"] = 760,
        ["cyclones"] =
        {
        }, -- end of ["cyclones"]
        ["dust_density"] = 0,
        ["enable_dust"] = false,
        ["clouds"] =
        {
            ["thickness"] = 200,
            ["density"] = 0,
            ["base"] = 300,
            ["iprecptns"] = 0,
        }, -- end of ["clouds"]
        ["groundTurbulence"] = 0,
        ["visibility"] =
        {
            ["distance"] = 80000,
        }, -- end of ["visibility"]
        ["fog"] =
        {
            ["thickness"] = 0,
            ["visibility"] = 0,
        }, -- end of ["fog"]
    }, -- end of ["weather"]
    ["coalition"] =
    {
        ["blue"] =
        {
            ["bullseye"] =
            {
                ["y"] = 617414,
                ["x"] = -291014,
            }, -- end of ["bullseye"]
            ["name"] = "blue",
            ["country"] =
            {
                [1] =
                {
                    ["id"] = 2,
                    ["name"] = "USA",
                    ["helicopter"] =
                    {
                        ["group"] =
                        {
                            [1] =
                            {
                                ["hidden"] = false,
                                ["groupId"] = 1,
                                ["name"] = "Hawg Flight",
                                ["task"] = "CAS",
                                ["start_time"] = 0,
                                ["frequency"] = 124,
                                ["x"] = -281713.5,
                                ["y"] = 647369.25,
                                ["units"] =
                                {
                                    [1] =
                                    {
                                        ["type"] = "Ka-50",
                                        ["unitId"] = 1,
                                        ["skill"] = "Client",
                                        ["name"] = "Hawg 1-1",
                                        ["livery_id"] = "default",
                                        ["onboard_num"] = "010",
                                        ["x"] = -281713.5,
                                        ["y"] = 647369.25,
                                        ["heading"] = 1.5707963267949,
                                        ["alt"] = 45,
                                        ["speed"] = 0,
                                        ["parking"] = "21",
                                        ["parking_id"] = "G21",
                                        ["Radio"] =
                                        {
                                            [1] =
                                            {
                                                ["channels"] =
                                                {
                                                    [1] = 21.5,
                                                    [2] = 25.7,
                                                    [3] = 27,
                                                }, -- end of ["channels"]
                                            }, -- end of [1]
                                            [2] =
                                            {
                                                ["channels"] =
                                                {
                                                    [1] = 0.625,
                                                    [2] = 0.303,
                                                }, -- end of ["channels"]
                                            }, -- end of [2]
                                        }, -- end of ["Radio"]
                                    }, -- end of [1]
                                    [2] =
                                    {
                                        ["type"] = "Ka-50",
                                        ["unitId"] = 2,
                                        ["skill"] = "Excellent",
                                        ["name"] = "Hawg 1-2",
                                        ["livery_id"] = "default",
                                        ["onboard_num"] = "011",
                                        ["x"] = -281733.5,
                                        ["y"] = 647389.25,
                                        ["heading"] = 1.5707963267949,
                                        ["alt"] = 45,
                                        ["speed"] = 0,
                                        ["parking"] = 22,
                                        ["parking_id"] = "G22",
                                    }, -- end of [2]
                                }, -- end of ["units"]
                            }, -- end of [1]
                        }, -- end of ["group"]
                    }, -- end of ["helicopter"]
                }, -- end of [1]
            }, -- end of ["country"]
        }, -- end of ["blue"]
        ["red"] =
        {
            ["bullseye"] =
            {
                ["y"] = 371700,
                ["x"] = 11557,
            }, -- end of ["bullseye"]
            ["name"] = "red",
            ["country"] =
            {
                [1] =
                {
                    ["id"] = 0,
                    ["name"] = "Russia",
                    ["vehicle"] =
                    {
                        ["group"] =
                        {
                            [1] =
                            {
                                ["hidden"] = false,
                                ["groupId"] = 2,
                                ["name"] = "Armor",
                                ["task"] = "Ground Nothing",
                                ["start_time"] = 0,
                                ["x"] = 11000,
                                ["y"] = 370000,
                                ["units"] =
                                {
                                    [1] =
                                    {
                                        ["type"] = "T-80UD",
                                        ["unitId"] = 3,
                                        ["skill"] = "Average",
                                        ["name"] = "Armor-1",
                                        ["x"] = 11000,
                                        ["y"] = 370000,
                                        ["heading"] = 0,
                                    }, -- end of [1]
                                }, -- end of ["units"]
                            }, -- end of [1]
                        }, -- end of ["group"]
                    }, -- end of ["vehicle"]
                    ["ship"] =
                    {
                        ["group"] =
                        {
                            [1] =
                            {
                                ["hidden"] = true,
                                ["groupId"] = 3,
                                ["name"] = "Navy",
                                ["task"] = "Ground Nothing",
                                ["start_time"] = 0,
                                ["x"] = -40000,
                                ["y"] = 240000,
                                ["units"] =
                                {
                                    [1] =
                                    {
                                        ["type"] = "MOSCOW",
                                        ["unitId"] = 4,
                                        ["skill"] = "Average",
                                        ["name"] = "Navy-1",
                                        ["x"] = -40000,
                                        ["y"] = 240000,
                                        ["heading"] = 3.14,
                                    }, -- end of [1]
                                }, -- end of ["units"]
                            }, -- end of [1]
                        }, -- end of ["group"]
                    }, -- end of ["ship"]
                }, -- end of [1]
            }, -- end of ["country"]
        }, -- end of ["red"]
    }, -- end of ["coalition"]
} -- end of mission
"#;

pub const DICTIONARY: &str = "dictionary = \n{\n    [\"DictKey_descriptionText_1\"] = \"Strike the bridge.\\\nReturn to base.\",\n    [\"DictKey_descriptionRedTask_2\"] = \"\",\n    [\"DictKey_descriptionBlueTask_3\"] = \"Destroy the bridge\",\n    [\"DictKey_sortie_4\"] = \"Opération Café\",\n} -- end of dictionary\n";

pub const MAP_RESOURCE: &str = "mapResource = \n{\n    [\"ResKey_Action_5\"] = \"briefing.jpg\",\n} -- end of mapResource\n";

pub const OPTIONS: &str = "options = \n{\n    [\"difficulty\"] = \n    {\n        [\"labels\"] = 1,\n    }, -- end of [\"difficulty\"]\n} -- end of options\n";

pub const WAREHOUSES: &str = "warehouses = \n{\n    [\"airports\"] = \n    {\n    }, -- end of [\"airports\"]\n} -- end of warehouses\n";

pub const BRIEFING_IMAGE: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0xFF];

/// One archive member; `None` content marks a directory entry.
pub type Member = (String, Option<Vec<u8>>);

/// Members of the standard fixture, in archive order. Lua members are Windows-1252 bytes.
pub fn standard_members() -> Vec<Member> {
    let lua = |text: &str| -> Vec<u8> {
        mizkit::encoding::encode(text)
            .map(|bytes| bytes.into_owned())
            .unwrap_or_default()
    };
    vec![
        ("mission".to_string(), Some(lua(MISSION))),
        ("options".to_string(), Some(lua(OPTIONS))),
        ("warehouses".to_string(), Some(lua(WAREHOUSES))),
        ("l10n/".to_string(), None),
        ("l10n/DEFAULT/".to_string(), None),
        ("l10n/DEFAULT/dictionary".to_string(), Some(lua(DICTIONARY))),
        ("l10n/DEFAULT/mapResource".to_string(), Some(lua(MAP_RESOURCE))),
        ("l10n/DEFAULT/briefing.jpg".to_string(), Some(BRIEFING_IMAGE.to_vec())),
    ]
}

pub fn write_miz(path: &Path, members: &[Member]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in members {
        match content {
            Some(bytes) => {
                zip.start_file(name.as_str(), options)?;
                zip.write_all(bytes)?;
            }
            None => zip.add_directory(name.as_str(), options)?,
        }
    }
    zip.finish()?;
    Ok(())
}

/// Writes the standard fixture as `<dir>/training.miz`.
pub fn fixture() -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("training.miz");
    write_miz(&path, &standard_members())?;
    Ok((dir, path))
}

/// Like [`fixture`], with the named member's bytes replaced (or dropped when `content` is `None`).
pub fn fixture_with(member: &str, content: Option<&[u8]>) -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("training.miz");
    let members: Vec<Member> = standard_members()
        .into_iter()
        .filter_map(|(name, bytes)| {
            if name != member {
                return Some((name, bytes));
            }
            content.map(|c| (name, Some(c.to_vec())))
        })
        .collect();
    write_miz(&path, &members)?;
    Ok((dir, path))
}

/// Every member of an archive in stored order: (name, is_dir, bytes).
pub fn read_members(path: &Path) -> Result<Vec<(String, bool, Vec<u8>)>> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut members = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        members.push((entry.name().to_string(), entry.is_dir(), bytes));
    }
    Ok(members)
}

pub fn member(path: &Path, name: &str) -> Result<Vec<u8>> {
    read_members(path)?
        .into_iter()
        .find(|(n, _, _)| n == name)
        .map(|(_, _, bytes)| bytes)
        .ok_or_else(|| format!("no member {name}").into())
}

/// Number of scratch directories left under `parent`.
pub fn leftover_scratch(parent: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(parent)? {
        if entry?.file_name().to_string_lossy().starts_with(mizkit::statics::SCRATCH_PREFIX) {
            count += 1;
        }
    }
    Ok(count)
}
