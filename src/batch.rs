//! Parallel per-item extraction.
//!
//! Every mail and attachment is an independent unit of work, so a batch is a
//! plain scatter-gather: a feeder thread pushes jobs into a bounded queue,
//! scoped workers map them, and the calling thread collects results back
//! into input order. A slow or failing item only occupies its own worker.

use std::thread;

use crossbeam::channel;
use tracing::debug;

/// Resolve a configured worker count, where 0 means one per CPU.
pub fn effective_workers(configured: usize) -> usize {
    if configured == 0 {
        num_cpus::get().max(1)
    } else {
        configured
    }
}

/// Map `jobs` through `mapper` on up to `workers` threads.
///
/// Results come back in the same order as `jobs`. `queue_depth` bounds how
/// many jobs wait in the queue at once. The progress callback receives
/// `(completed, total)` on the calling thread.
pub fn run_parallel<I, O, F>(
    jobs: Vec<I>,
    workers: usize,
    queue_depth: usize,
    mapper: F,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Vec<O>
where
    I: Send,
    O: Send,
    F: Fn(I) -> O + Sync,
{
    let total = jobs.len();
    let workers = effective_workers(workers).min(total.max(1));

    if workers <= 1 {
        return jobs
            .into_iter()
            .enumerate()
            .map(|(i, job)| {
                let out = mapper(job);
                if let Some(cb) = progress {
                    cb(i + 1, total);
                }
                out
            })
            .collect();
    }

    debug!(workers, total, "Starting parallel batch");

    let (job_send, job_recv) = channel::bounded::<(usize, I)>(queue_depth.max(1));
    let (out_send, out_recv) = channel::unbounded::<(usize, O)>();
    let mut slots: Vec<Option<O>> = (0..total).map(|_| None).collect();

    thread::scope(|s| {
        for _ in 0..workers {
            let job_recv = job_recv.clone();
            let out_send = out_send.clone();
            let mapper = &mapper;
            s.spawn(move || {
                for (i, job) in job_recv.iter() {
                    if out_send.send((i, mapper(job))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_recv);
        drop(out_send);

        s.spawn(move || {
            for item in jobs.into_iter().enumerate() {
                if job_send.send(item).is_err() {
                    break;
                }
            }
        });

        for (done, (i, out)) in out_recv.iter().enumerate() {
            slots[i] = Some(out);
            if let Some(cb) = progress {
                cb(done + 1, total);
            }
        }
    });

    slots.into_iter().flatten().collect()
}
