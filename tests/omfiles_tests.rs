use omfiles::backend::memory::InMemoryBackend;
use omfiles::{ArrayEncoder, CompressionType, Dimensions, Reader, Writer};
use rand::prelude::*;

fn write_single_array(
    dims: Dimensions,
    compression: CompressionType,
    scale_factor: f32,
    add_offset: f32,
    data: &[f32],
) -> InMemoryBackend {
    let mut writer = Writer::new(InMemoryBackend::new(), 4096).unwrap();
    let mut encoder: ArrayEncoder<f32> = writer
        .prepare_array(dims.clone(), compression, scale_factor, add_offset)
        .unwrap();
    let shape = dims.dimensions.clone();
    let offset = vec![0u64; shape.len()];
    {
        let raw = writer.raw_writer();
        encoder.write_data(raw, data, &shape, &offset, &shape).unwrap();
    }
    let root = writer.finish_array("data", encoder, vec![]).unwrap();
    writer.finish(root).unwrap()
}

#[test]
fn five_by_five_int16_round_trip() {
    let dims = Dimensions::new(vec![5, 5], vec![2, 2]).unwrap();
    let data: Vec<f32> = (0..25).map(|i| i as f32).collect();
    let backend = write_single_array(dims, CompressionType::PForDelta2DInt16, 100.0, 0.0, &data);

    let reader = Reader::open(backend).unwrap();
    let root = reader.root();
    let read_back: Vec<f32> = root.read_full().unwrap();
    for (a, b) in data.iter().zip(read_back.iter()) {
        assert!((a - b).abs() < 0.01, "{} vs {}", a, b);
    }
}

#[test]
fn one_dimensional_array_preserves_nan() {
    let dims = Dimensions::new(vec![8], vec![3]).unwrap();
    let data = vec![1.0f32, f32::NAN, 3.0, 4.0, f32::NAN, 6.0, 7.0, 8.0];
    let backend = write_single_array(dims, CompressionType::PForDelta2DInt16, 10.0, 0.0, &data);

    let reader = Reader::open(backend).unwrap();
    let read_back: Vec<f32> = reader.root().read_full().unwrap();
    for (a, b) in data.iter().zip(read_back.iter()) {
        if a.is_nan() {
            assert!(b.is_nan());
        } else {
            assert!((a - b).abs() < 0.1);
        }
    }
}

#[test]
fn three_dimensional_fpxor_is_bit_exact() {
    let dims = Dimensions::new(vec![3, 4, 5], vec![2, 2, 3]).unwrap();
    let data: Vec<f32> = (0..60).map(|i| (i as f32) * 0.333_333).collect();
    let backend = write_single_array(dims, CompressionType::FPXor2D, 1.0, 0.0, &data);

    let reader = Reader::open(backend).unwrap();
    let read_back: Vec<f32> = reader.root().read_full().unwrap();
    assert_eq!(data, read_back, "FPXor2D must be bit-exact");
}

#[test]
fn scalar_greeting_round_trips() {
    let mut writer = Writer::new(InMemoryBackend::new(), 128).unwrap();
    let root = writer
        .write_scalar("greeting", &"hello".to_string(), vec![])
        .unwrap();
    let backend = writer.finish(root).unwrap();

    let reader = Reader::open(backend).unwrap();
    let root = reader.root();
    assert_eq!(root.name(), "greeting");
    assert_eq!(root.read_scalar::<String>().unwrap(), "hello");
}

#[test]
fn array_with_two_scalar_children_round_trips() {
    let mut writer = Writer::new(InMemoryBackend::new(), 4096).unwrap();
    let lat = writer.write_scalar("latitude", &52.52f32, vec![]).unwrap();
    let lon = writer.write_scalar("longitude", &13.405f32, vec![]).unwrap();

    let dims = Dimensions::new(vec![4, 4], vec![2, 2]).unwrap();
    let mut encoder: ArrayEncoder<f32> = writer
        .prepare_array(dims, CompressionType::PForDelta2D, 1.0, 0.0)
        .unwrap();
    let data: Vec<f32> = (0..16).map(|i| i as f32).collect();
    {
        let raw = writer.raw_writer();
        encoder.write_data(raw, &data, &[4, 4], &[0, 0], &[4, 4]).unwrap();
    }
    let root = writer.finish_array("station", encoder, vec![lat, lon]).unwrap();
    let backend = writer.finish(root).unwrap();

    let reader = Reader::open(backend).unwrap();
    let root = reader.root();
    assert_eq!(root.children_count(), 2);
    assert_eq!(root.child_by_name("latitude").unwrap().read_scalar::<f32>().unwrap(), 52.52);
    assert_eq!(root.child_by_name("longitude").unwrap().read_scalar::<f32>().unwrap(), 13.405);
    let read_back: Vec<f32> = root.read_full().unwrap();
    assert_eq!(read_back, data);
}

#[test]
fn sub_cube_read_matches_full_read_slice() {
    let dims = Dimensions::new(vec![10, 10], vec![4, 4]).unwrap();
    let data: Vec<f32> = (0..100).map(|i| i as f32).collect();
    let backend = write_single_array(dims, CompressionType::FPXor2D, 1.0, 0.0, &data);

    let reader = Reader::open(backend).unwrap();
    let root = reader.root();
    let sub: Vec<f32> = root.read(&[3, 2], &[4, 5]).unwrap();
    for r in 0..4u64 {
        for c in 0..5u64 {
            let expected = data[((3 + r) * 10 + (2 + c)) as usize];
            assert_eq!(sub[(r * 5 + c) as usize], expected);
        }
    }
}

#[test]
fn random_sub_cube_reads_agree_with_the_source_array_across_many_shapes() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let rows = rng.gen_range(3..12);
        let cols = rng.gen_range(3..12);
        let chunk_rows = rng.gen_range(1..rows + 1);
        let chunk_cols = rng.gen_range(1..cols + 1);

        let dims = Dimensions::new(vec![rows, cols], vec![chunk_rows, chunk_cols]).unwrap();
        let data: Vec<f32> = (0..(rows * cols)).map(|i| i as f32).collect();
        let backend = write_single_array(dims, CompressionType::PForDelta2D, 1.0, 0.0, &data);
        let reader = Reader::open(backend).unwrap();
        let root = reader.root();

        let offset_r = rng.gen_range(0..rows);
        let offset_c = rng.gen_range(0..cols);
        let count_r = rng.gen_range(1..=(rows - offset_r));
        let count_c = rng.gen_range(1..=(cols - offset_c));

        let sub: Vec<f32> = root.read(&[offset_r, offset_c], &[count_r, count_c]).unwrap();
        for r in 0..count_r {
            for c in 0..count_c {
                let expected = data[((offset_r + r) * cols + (offset_c + c)) as usize];
                let got = sub[(r * count_c + c) as usize];
                assert!((expected - got).abs() < 0.01);
            }
        }
    }
}
