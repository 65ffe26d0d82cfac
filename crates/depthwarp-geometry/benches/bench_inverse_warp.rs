use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use depthwarp_geometry::fisheye::{
    EquidistantFisheye, FisheyeOptions, LensCalibration, LensRectifier,
};
use depthwarp_geometry::{rotation::RotationMode, InverseWarper};
use depthwarp_imgproc::interpolation::PaddingMode;
use depthwarp_tensor::{Tensor2, Tensor3, Tensor4};

fn intrinsics(width: usize, height: usize) -> Tensor3<f32> {
    let (w, h) = (width as f32, height as f32);
    Tensor3::from_shape_vec(
        [1, 3, 3],
        vec![w, 0.0, w / 2.0, 0.0, w, h / 2.0, 0.0, 0.0, 1.0],
    )
    .unwrap()
}

fn bench_inverse_warp(c: &mut Criterion) {
    let mut group = c.benchmark_group("InverseWarp");
    let warper = InverseWarper::new();

    for (width, height) in [(256, 224), (512, 448), (832, 256)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let img = Tensor4::<f32>::from_shape_val([1, 3, *height, *width], 0.5);
        let depth = Tensor3::<f32>::from_shape_val([1, *height, *width], 10.0);
        let pose =
            Tensor2::from_shape_vec([1, 6], vec![0.1, 0.0, 0.2, 0.01, -0.02, 0.005]).unwrap();
        let k = intrinsics(*width, *height);

        group.bench_with_input(
            BenchmarkId::new("euler_zeros", &parameter_string),
            &(&img, &depth, &pose, &k),
            |b, i| {
                let (img, depth, pose, k) = *i;
                b.iter(|| {
                    warper.inverse_warp(
                        black_box(img),
                        black_box(depth),
                        black_box(pose),
                        black_box(k),
                        RotationMode::Euler,
                        PaddingMode::Zeros,
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_inverse_warp2(c: &mut Criterion) {
    let mut group = c.benchmark_group("InverseWarp2");
    let rectifier = LensRectifier::new(EquidistantFisheye::new(450.0), LensCalibration::default());
    let warper = InverseWarper::new().with_lens(rectifier);

    for (width, height) in [(256, 224), (832, 256)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let img = Tensor4::<f32>::from_shape_val([1, 3, *height, *width], 0.5);
        let depth = Tensor4::<f32>::from_shape_val([1, 1, *height, *width], 10.0);
        let pose =
            Tensor2::from_shape_vec([1, 6], vec![0.1, 0.0, 0.2, 0.01, -0.02, 0.005]).unwrap();
        let k = intrinsics(*width, *height);

        for enabled in [false, true] {
            let name = if enabled { "fisheye" } else { "pinhole" };
            let fisheye = FisheyeOptions {
                enabled,
                crop_lines: 80,
            };
            group.bench_with_input(
                BenchmarkId::new(name, &parameter_string),
                &(&img, &depth, &pose, &k),
                |b, i| {
                    let (img, depth, pose, k) = *i;
                    b.iter(|| {
                        warper.inverse_warp2(
                            black_box(img),
                            black_box(depth),
                            black_box(depth),
                            black_box(pose),
                            black_box(k),
                            PaddingMode::Zeros,
                            black_box(fisheye),
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_inverse_warp, bench_inverse_warp2);
criterion_main!(benches);
