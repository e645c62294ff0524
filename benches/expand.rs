use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opendata_downloader::{render, DownloadRequest, ModelCatalog, RequestExpander, TemplateValues};

fn bench_expand(c: &mut Criterion) {
    let catalog = ModelCatalog::bundled().unwrap();
    let run = NaiveDate::from_ymd_opt(2020, 6, 26)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let request = DownloadRequest::builder()
        .model("icon-eu")
        .fields("t_2m,tmax_2m,tmin_2m,clch,clcm,clcl,pmsl,tot_prec")
        .max_time_step(120)
        .time_step_interval(1)
        .timestamp(run)
        .directory("/tmp")
        .build()
        .unwrap();
    let values = TemplateValues::new().with("model", "ICON").with("param", "t_2m");

    c.bench_function("expand_icon_eu_120_steps", |b| {
        b.iter(|| RequestExpander::new(&catalog).expand(black_box(&request)))
    });
    c.bench_function("render_case_conversions", |b| {
        b.iter(|| render(black_box("{model!L}_{param!U}"), &values))
    });
}

criterion_group!(benches, bench_expand);
criterion_main!(benches);
