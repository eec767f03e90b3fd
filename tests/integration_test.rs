use hlc_model::analyzer::{analyze, read_headers};
use hlc_model::bitstream::{BitReader, BitWriter, InputBitStream, OutputBitStream};
use hlc_model::config::ModelConfig;
use hlc_model::{
    decode_alphabet, encode_alphabet, first_order_entropy_1024, normalize_frequencies,
    read_var_int, write_var_int, Alphabet, FrequencyModel,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;

fn random_alphabet(rng: &mut StdRng, capacity: usize, count: usize) -> Alphabet {
    if count == capacity {
        let symbols: Vec<u8> = (0..capacity).map(|s| s as u8).collect();
        return Alphabet::from_symbols(&symbols, capacity).unwrap();
    }

    let mut symbols: Vec<u8> = rand::seq::index::sample(rng, capacity, count)
        .into_vec()
        .into_iter()
        .map(|s| s as u8)
        .collect();
    symbols.sort_unstable();
    Alphabet::from_symbols(&symbols, capacity).unwrap()
}

#[test]
fn alphabet_round_trip_every_capacity_and_count() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut expected = Vec::new();
    let mut writer = BitWriter::new(Vec::new());

    for log in 0..=8 {
        let capacity = 1usize << log;

        for count in 0..=capacity {
            let alphabet = random_alphabet(&mut rng, capacity, count);
            assert_eq!(encode_alphabet(&mut writer, &alphabet).unwrap(), count);
            expected.push(alphabet);
        }
    }

    // Every alphabet shares one stream, so bit alignment between them is exercised too
    let data = writer.close().unwrap();
    let mut reader = BitReader::new(Cursor::new(data));

    for alphabet in expected {
        let mut decoded = Alphabet::with_capacity(alphabet.capacity());
        let count = decode_alphabet(&mut reader, &mut decoded).unwrap();
        assert_eq!(count, alphabet.len());
        assert_eq!(decoded.symbols(), alphabet.symbols());
    }
}

#[test]
fn normalization_is_exact_for_random_histograms() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..500 {
        let present = rng.gen_range(1..=256);
        let skewed = rng.gen_bool(0.3);
        let mut freqs = [0u32; 256];

        for symbol in rand::seq::index::sample(&mut rng, 256, present).into_vec() {
            freqs[symbol] = if skewed && rng.gen_bool(0.1) {
                rng.gen_range(100_000..1_000_000)
            } else {
                rng.gen_range(1..50)
            };
        }

        let raw = freqs;
        let total: u32 = freqs.iter().sum();
        let scale = rng.gen_range(256..=65536);
        let mut alphabet = Alphabet::bytes();

        let size = normalize_frequencies(&mut freqs, &mut alphabet, total, scale).unwrap();
        assert_eq!(size, present);
        assert_eq!(freqs.iter().sum::<u32>(), scale);
        assert!(alphabet.symbols().windows(2).all(|w| w[0] < w[1]));

        for symbol in 0..256 {
            assert_eq!(raw[symbol] > 0, freqs[symbol] > 0, "symbol {} starved", symbol);
        }

        // Same input, same output
        let mut again = raw;
        let mut alphabet_again = Alphabet::bytes();
        normalize_frequencies(&mut again, &mut alphabet_again, total, scale).unwrap();
        assert_eq!(again, freqs);
        assert_eq!(alphabet_again, alphabet);
    }
}

#[test]
fn single_symbol_always_gets_the_whole_scale() {
    for scale in [256u32, 257, 1000, 4096, 65535, 65536] {
        for count in [1u32, 3, 1_000_000] {
            let mut freqs = [0u32; 256];
            freqs[200] = count;
            let mut alphabet = Alphabet::bytes();

            assert_eq!(normalize_frequencies(&mut freqs, &mut alphabet, count, scale).unwrap(), 1);
            assert_eq!(freqs[200], scale);
            assert_eq!(alphabet.symbols(), &[200]);
        }
    }
}

#[test]
fn var_int_round_trip_in_a_shared_stream() {
    let values = [0u32, 127, 128, 16383, 16384, 2097151, 268435455];
    let mut writer = BitWriter::new(Vec::new());

    // Odd leading bit keeps every group unaligned
    writer.write_bit(1).unwrap();
    for &value in &values {
        write_var_int(&mut writer, value).unwrap();
    }

    let mut reader = BitReader::new(Cursor::new(writer.close().unwrap()));
    assert_eq!(reader.read_bit().unwrap(), 1);
    for &value in &values {
        assert_eq!(read_var_int(&mut reader).unwrap(), value);
    }
}

#[test]
fn entropy_orders_blocks_by_compressibility() {
    let mut histo = [0u32; 256];
    let mut rng = StdRng::seed_from_u64(99);

    let text = b"It was the best of times, it was the worst of times. ".repeat(40);
    let random: Vec<u8> = (0..text.len()).map(|_| rng.gen()).collect();

    let text_entropy = first_order_entropy_1024(&text, &mut histo);
    let random_entropy = first_order_entropy_1024(&random, &mut histo);

    assert!(text_entropy < 700);
    assert!(random_entropy > 950);
    assert_eq!(histo.iter().sum::<u32>(), random.len() as u32);
}

#[test]
fn model_headers_survive_a_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.bin");

    let mut data = b"Hybrid lossless compression platform. ".repeat(300);
    data.extend(std::iter::repeat(0u8).take(5000));
    let config = ModelConfig::default().with_block_size(4096).with_threads(4);

    let report = analyze(&data, &config).unwrap();
    std::fs::write(&path, report.headers()).unwrap();

    let models = read_headers(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(models.len(), report.blocks.len());
    assert_eq!(models, report.models());

    for model in models.iter().filter(|m| !m.is_stored()) {
        let cumulative = model.cumulative();
        assert_eq!(cumulative[256], config.scale);
        for &symbol in model.alphabet().symbols() {
            assert!(cumulative[symbol as usize + 1] > cumulative[symbol as usize]);
        }
    }
}

#[test]
fn model_headers_can_be_read_from_the_middle_of_a_stream() {
    let first = FrequencyModel::build(b"mississippi", 1024).unwrap();
    let second = FrequencyModel::build(&[9u8; 64], 65536).unwrap();

    let mut writer = BitWriter::new(Vec::new());
    writer.write_bits(0b101, 3).unwrap();
    let bits = first.write(&mut writer).unwrap() + second.write(&mut writer).unwrap();
    assert_eq!(writer.written(), bits + 3);

    let mut reader = BitReader::new(Cursor::new(writer.close().unwrap()));
    assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    assert_eq!(FrequencyModel::read(&mut reader).unwrap(), first);
    assert_eq!(FrequencyModel::read(&mut reader).unwrap(), second);
}
