//! Decoding tests for synthetic MDV volumes

mod common;

use std::io::Cursor;

use common::*;
use mdv2rainbow::mdv::{
    CompressionKind, EncodingType, MdvError, MdvReader, ProjectionType, TransformType,
};
use ndarray::array;

fn reader(fixture: &MdvFixture) -> MdvReader<Cursor<Vec<u8>>> {
    MdvReader::new(Cursor::new(fixture.build()))
}

#[test]
fn test_headers() {
    let fixture = MdvFixture::new()
        .field(FixtureField::int8("DBZ", 3, 2, vec![vec![0; 6], vec![0; 6]]))
        .field(FixtureField::int16("VEL", 3, 2, &[vec![0; 6]]))
        .radar(FixtureRadar::default())
        .elevations(&[0.5, 1.5]);

    let headers = reader(&fixture).read_headers().unwrap();
    assert_eq!(headers.master.n_fields, 2);
    assert_eq!(headers.master.n_chunks, 2);
    assert_eq!(headers.master.time_begin, BEGIN_TIME);
    assert_eq!(headers.master.data_set_name, "test volume");

    let dbz = &headers.fields[0];
    assert_eq!(dbz.field_name, "DBZ");
    assert_eq!(dbz.field_name_long, "DBZ long name");
    assert_eq!((dbz.nx, dbz.ny, dbz.nz), (3, 2, 2));
    assert_eq!(dbz.encoding_type, EncodingType::Int8);
    assert_eq!(dbz.proj_type, ProjectionType::PolarRadar);
    assert_eq!(dbz.transform_type, TransformType::None);
    assert_eq!(headers.fields[1].encoding_type, EncodingType::Int16);

    // vlevel arrays are cut to nz
    assert_eq!(headers.vlevels[0].levels, vec![0.5, 1.5]);
    assert_eq!(headers.vlevels[1].levels, vec![0.5]);
    assert_eq!(headers.vlevels[1].types, vec![9]);

    assert_eq!(headers.chunks.len(), 2);
    assert_eq!(headers.chunks[0].info, "DsRadar params");
}

#[test]
fn test_chunks_decoded_and_unknown_ignored() {
    let fixture = MdvFixture::new()
        .field(FixtureField::int8("DBZ", 1, 1, vec![vec![7]]))
        .radar(FixtureRadar::default())
        .elevations(&[0.5, 1.5, 2.4])
        .unknown_chunk();

    let volume = reader(&fixture).read_volume().unwrap();
    let params = volume.radar_params.as_ref().unwrap();
    assert_eq!(params.radar_id, 17);
    assert_eq!(params.radar_name, "OPERA");
    assert_eq!(params.scan_type_name, "SUR");
    assert_eq!(params.samples_per_beam, 32);
    assert!((params.wavelength - 5.3).abs() < 1e-6);
    assert_eq!(volume.elevations.as_ref().unwrap().angles, vec![0.5, 1.5, 2.4]);
}

#[test]
fn test_no_chunks() {
    let fixture = MdvFixture::new().field(FixtureField::int8("DBZ", 1, 1, vec![vec![7]]));
    let volume = reader(&fixture).read_volume().unwrap();
    assert!(volume.radar_params.is_none());
    assert!(volume.elevations.is_none());
    assert_eq!(volume.elevation_angles("DBZ"), vec![0.5]);
}

#[test]
fn test_grid_shape_and_int8_values() {
    let fixture = MdvFixture::new().field(
        FixtureField::int8("DBZ", 3, 2, vec![vec![1, 2, 3, 4, 5, 6], vec![10, 20, 30, 40, 50, 60]])
            .with_scale(0.5, -32.0),
    );
    let volume = reader(&fixture).read_volume().unwrap();
    let grid = volume.grid("DBZ").unwrap();

    assert_eq!(grid.dim(), (2, 2, 3));
    assert_eq!(grid.len(), 2 * 2 * 3);
    assert_eq!(grid[[0, 0, 0]], -31.5);
    assert_eq!(grid[[0, 1, 2]], -29.0);
    assert_eq!(grid[[1, 1, 2]], -2.0);
}

/// DEFLATE 16-bit field: raw [100, 200] with scale 0.5, bias -10
#[test]
fn test_int16_scale_bias() {
    let fixture = MdvFixture::new()
        .field(FixtureField::int16("VEL", 2, 1, &[vec![100, 200]]).with_scale(0.5, -10.0));
    let volume = reader(&fixture).read_volume().unwrap();
    let level = volume.level("VEL", 0).unwrap();
    assert_eq!(level, array![[40.0f32, 90.0]]);
}

#[test]
fn test_gzip_float32() {
    let fixture = MdvFixture::new().field(
        FixtureField::float32("ZDR", 2, 2, &[vec![1.0, 2.0, 3.0, 4.0]])
            .with_compression(CompressionKind::Gzip),
    );
    let volume = reader(&fixture).read_volume().unwrap();
    assert_eq!(volume.level("ZDR", 0).unwrap(), array![[1.0f32, 2.0], [3.0, 4.0]]);
}

/// Uncompressed FLOAT32 plane is refused rather than passed through
#[test]
fn test_not_compressed_is_unsupported() {
    let fixture = MdvFixture::new().field(
        FixtureField::float32("DBZ", 2, 2, &[vec![1.0, 2.0, 3.0, 4.0]])
            .with_compression(CompressionKind::NotCompressed),
    );
    match reader(&fixture).read_volume() {
        Err(MdvError::UnsupportedCompression { field, level, kind }) => {
            assert_eq!(field, "DBZ");
            assert_eq!(level, 0);
            assert_eq!(kind, CompressionKind::NotCompressed);
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_bzip_is_unsupported_at_failing_level() {
    // only the second level is bzip
    let fixture = MdvFixture::new().field(FixtureField::int8("DBZ", 1, 1, vec![vec![1], vec![2]]));
    let mut bytes = fixture.build();
    let zlib_cookie = CompressionKind::Zlib.cookie().to_be_bytes();
    let last = bytes
        .windows(4)
        .rposition(|w| w == zlib_cookie)
        .unwrap();
    bytes[last..last + 4].copy_from_slice(&CompressionKind::Bzip.cookie().to_be_bytes());

    match MdvReader::new(Cursor::new(bytes)).read_volume() {
        Err(MdvError::UnsupportedCompression { level, kind, .. }) => {
            assert_eq!(level, 1);
            assert_eq!(kind, CompressionKind::Bzip);
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_log_transform_is_unsupported() {
    let fixture =
        MdvFixture::new().field(FixtureField::int8("DBZ", 1, 1, vec![vec![1]]).with_transform(1));
    assert!(matches!(
        reader(&fixture).read_volume(),
        Err(MdvError::UnsupportedTransform {
            transform: TransformType::Log,
            ..
        })
    ));
}

#[test]
fn test_rgba_is_unsupported() {
    let mut field = FixtureField::float32("DBZ", 1, 1, &[vec![1.0]]);
    field.encoding = ENCODING_RGBA32;
    let fixture = MdvFixture::new().field(field);
    assert!(matches!(
        reader(&fixture).read_volume(),
        Err(MdvError::UnsupportedEncoding {
            encoding: EncodingType::Rgba32,
            ..
        })
    ));
}

#[test]
fn test_unknown_encoding_code() {
    let mut field = FixtureField::int8("DBZ", 1, 1, vec![vec![1]]);
    field.encoding = 3;
    let fixture = MdvFixture::new().field(field);
    assert!(matches!(
        reader(&fixture).read_headers(),
        Err(MdvError::UnknownCode {
            what: "encoding type",
            value: 3
        })
    ));
}

/// Cartesian levels are flipped north-up; polar levels are untouched
#[test]
fn test_projection_row_order() {
    let plane: Vec<u8> = (1..=9).collect();
    let fixture = MdvFixture::new()
        .field(FixtureField::int8("FLAT", 3, 3, vec![plane.clone()]).with_projection(PROJ_FLAT))
        .field(FixtureField::int8("LL", 3, 3, vec![plane.clone()]).with_projection(PROJ_LATLON))
        .field(FixtureField::int8("POLAR", 3, 3, vec![plane]).with_projection(PROJ_POLAR));
    let volume = reader(&fixture).read_volume().unwrap();

    let flipped = array![[7.0f32, 8.0, 9.0], [4.0, 5.0, 6.0], [1.0, 2.0, 3.0]];
    let original = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
    assert_eq!(volume.level("FLAT", 0).unwrap(), flipped);
    assert_eq!(volume.level("LL", 0).unwrap(), flipped);
    assert_eq!(volume.level("POLAR", 0).unwrap(), original);
}

#[test]
fn test_filtered_read_skips_decode() {
    // NCP carries an unsupported plane; it must never be decoded
    let fixture = MdvFixture::new()
        .field(FixtureField::int8("DBZ", 1, 1, vec![vec![1]]))
        .field(
            FixtureField::int8("NCP", 1, 1, vec![vec![1]])
                .with_compression(CompressionKind::Bzip),
        );

    let volume = reader(&fixture)
        .read_volume_filtered(|name| name == "DBZ")
        .unwrap();
    assert_eq!(volume.field_names().collect::<Vec<_>>(), vec!["DBZ"]);
    assert_eq!(volume.field_headers.len(), 2);
    assert!(volume.grid("NCP").is_none());
}

#[test]
fn test_plane_size_mismatch() {
    let fixture = MdvFixture::new().field(FixtureField::int8("DBZ", 2, 2, vec![vec![1, 2, 3]]));
    assert!(matches!(
        reader(&fixture).read_volume(),
        Err(MdvError::PlaneSize {
            expected: 4,
            actual: 3,
            ..
        })
    ));
}

#[test]
fn test_truncated_file() {
    let fixture = MdvFixture::new().field(FixtureField::int8("DBZ", 4, 4, vec![vec![5; 16]]));
    let bytes = fixture.build();

    // inside the field header array
    let cut = bytes[..1200].to_vec();
    match MdvReader::new(Cursor::new(cut)).read_headers() {
        Err(MdvError::Truncated {
            expected,
            available,
            ..
        }) => {
            assert_eq!(expected, 416);
            assert_eq!(available, 176);
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }

    // inside the last compressed plane
    let cut = bytes[..bytes.len() - 3].to_vec();
    assert!(matches!(
        MdvReader::new(Cursor::new(cut)).read_volume(),
        Err(MdvError::Truncated { .. })
    ));
}

#[test]
fn test_bad_record_length() {
    let mut bytes = MdvFixture::new().build();
    bytes[..4].copy_from_slice(&1016u32.swap_bytes().to_be_bytes());
    assert!(matches!(
        MdvReader::new(Cursor::new(bytes)).read_headers(),
        Err(MdvError::InvalidHeader(_))
    ));
}

#[test]
fn test_decode_is_idempotent() {
    let fixture = MdvFixture::new()
        .field(FixtureField::int8("DBZ", 3, 2, vec![vec![1, 2, 3, 4, 5, 6]]))
        .field(FixtureField::int16("VEL", 3, 2, &[vec![9, 8, 7, 6, 5, 4]]).with_scale(0.1, -3.0));
    let bytes = fixture.build();

    let first = MdvReader::new(Cursor::new(bytes.clone())).read_volume().unwrap();
    let second = MdvReader::new(Cursor::new(bytes)).read_volume().unwrap();
    for name in ["DBZ", "VEL"] {
        assert_eq!(first.grid(name), second.grid(name));
    }
}

#[test]
fn test_open_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("volume.mdv");
    let fixture = MdvFixture::new().field(FixtureField::int8("DBZ", 1, 1, vec![vec![3]]));
    std::fs::write(&path, fixture.build()).unwrap();

    let volume = MdvReader::open(&path).unwrap().read_volume().unwrap();
    assert_eq!(volume.grid("DBZ").unwrap()[[0, 0, 0]], 3.0);
}

#[test]
fn test_duplicate_field_decodes_first_only() {
    let fixture = MdvFixture::new()
        .field(FixtureField::int8("DBZ", 3, 4, vec![vec![7; 12], vec![8; 12]]))
        .field(FixtureField::int8("DBZ", 5, 4, vec![vec![9; 20]]));
    let volume = reader(&fixture).read_volume().unwrap();

    assert_eq!(volume.field_names().count(), 1);
    let grid = volume.grid("DBZ").unwrap();
    assert_eq!(grid.dim(), (2, 4, 3));
    assert!(grid.iter().all(|&v| v == 7.0 || v == 8.0));
    let (header, _) = volume.field("DBZ").unwrap();
    assert_eq!(header.nx, 3);
}

#[test]
fn test_level_size_smaller_than_plane() {
    let fixture = MdvFixture::new().field(FixtureField::int8("DBZ", 2, 2, vec![vec![1; 4]]));
    let mut bytes = fixture.build();
    let headers = MdvReader::new(Cursor::new(bytes.clone()))
        .read_headers()
        .unwrap();

    // sizes follow the nz offsets of the level table
    let sizes_at = headers.fields[0].field_data_offset as usize + 4;
    bytes[sizes_at..sizes_at + 4].copy_from_slice(&10u32.to_be_bytes());

    match MdvReader::new(Cursor::new(bytes)).read_volume() {
        Err(MdvError::InvalidHeader(message)) => assert!(message.contains("level table")),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}
