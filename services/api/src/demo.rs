use crate::infra::{InMemoryBidRepository, InMemoryEvaluationLog, InMemoryNotificationDispatcher};
use clap::Args;
use etender::error::AppError;
use etender::workflows::bids::{
    evaluate, AwardRequest, BidEvaluationService, BidSubmission, BidderId, EvaluationRequest,
    EvaluatorId, ScoreCard, StageAssessment, TenderId,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Technical sub-score (nominally 0-100)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) technical: f64,
    /// Financial sub-score (nominally 0-100)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) financial: f64,
    /// Experience sub-score (nominally 0-100)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) experience: f64,
    /// Print the assessment as JSON instead of a summary line
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Tender identifier used for the sample bids
    #[arg(long, default_value = "TND-2025-001")]
    pub(crate) tender: String,
    /// Page size for the printed shortlist
    #[arg(long, default_value_t = 10)]
    pub(crate) page_size: usize,
    /// Stop after the shortlist instead of awarding the tender
    #[arg(long)]
    pub(crate) skip_award: bool,
}

/// Scores are classified as given; out-of-range values are not rejected here.
pub(crate) fn run_evaluate(args: EvaluateArgs) {
    let scores = ScoreCard::new(args.technical, args.financial, args.experience);
    let assessment = evaluate(&scores);

    if args.json {
        match serde_json::to_string_pretty(&assessment) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Assessment unavailable: {err}"),
        }
    } else {
        println!("{}", describe(&assessment));
    }
}

fn describe(assessment: &StageAssessment) -> String {
    format!(
        "composite {:.2} -> stage {} -> status {}",
        assessment.composite_score, assessment.stage, assessment.status
    )
}

struct SampleBid {
    bidder_id: u64,
    bidder_name: &'static str,
    amount: f64,
    scores: ScoreCard,
}

const SAMPLE_BIDS: [SampleBid; 4] = [
    SampleBid {
        bidder_id: 101,
        bidder_name: "Northwind Civil Works",
        amount: 1_250_000.0,
        scores: ScoreCard::new(92.0, 85.0, 88.0),
    },
    SampleBid {
        bidder_id: 102,
        bidder_name: "Harbor Construction",
        amount: 1_180_000.0,
        scores: ScoreCard::new(75.0, 72.0, 60.0),
    },
    SampleBid {
        bidder_id: 103,
        bidder_name: "Summit Engineering",
        amount: 1_320_000.0,
        scores: ScoreCard::new(78.0, 70.0, 71.0),
    },
    SampleBid {
        bidder_id: 104,
        bidder_name: "Lakeside Builders",
        amount: 990_000.0,
        scores: ScoreCard::new(55.0, 60.0, 40.0),
    },
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        tender,
        page_size,
        skip_award,
    } = args;

    let repository = Arc::new(InMemoryBidRepository::default());
    let log = Arc::new(InMemoryEvaluationLog::default());
    let notifications = Arc::new(InMemoryNotificationDispatcher::default());
    let service = BidEvaluationService::new(repository.clone(), log, notifications.clone());
    let tender_id = TenderId(tender);
    let evaluator_id = EvaluatorId(1);

    println!("Bid evaluation demo for tender {tender_id}");
    for sample in &SAMPLE_BIDS {
        let record = service.submit(BidSubmission {
            tender_id: tender_id.clone(),
            bidder_id: BidderId(sample.bidder_id),
            bidder_name: sample.bidder_name.to_string(),
            amount: sample.amount,
            technical_proposal: String::new(),
        })?;
        let receipt = service.evaluate(
            &record.bid_id,
            EvaluationRequest {
                evaluator_id,
                scores: sample.scores,
                comments: None,
            },
        )?;
        println!(
            "- {} ({}, {:.2}): composite {:.2} -> {} / {}",
            record.bid_id,
            record.bidder_name,
            record.amount,
            receipt.composite_score,
            receipt.stage,
            receipt.status
        );
    }

    let shortlist = service.shortlist(&tender_id, 1, Some(page_size))?;
    if shortlist.bids.is_empty() {
        println!("\nShortlist: none");
    } else {
        println!(
            "\nShortlist ({} bids, page {}/{})",
            shortlist.total_count, shortlist.current_page, shortlist.total_pages
        );
        for view in &shortlist.bids {
            println!(
                "- {} {}: composite {:.2}",
                view.bid_id,
                view.bidder_name,
                view.composite_score.unwrap_or_default()
            );
        }
    }

    if skip_award {
        print_outbox(&notifications);
        return Ok(());
    }

    let Some(winner) = shortlist.bids.first() else {
        println!("\nNo shortlisted bid to award");
        print_outbox(&notifications);
        return Ok(());
    };

    let outcome = service.award(
        &tender_id,
        AwardRequest {
            evaluator_id: EvaluatorId(2),
            winning_bid_id: winner.bid_id.clone(),
        },
    )?;
    println!(
        "\nAwarded {} to {} ({} bids rejected)",
        outcome.tender_id, outcome.winning_bid_id, outcome.rejected_count
    );
    if let Some(status) = repository.tender_status(&tender_id) {
        println!("Tender status: {}", status.label());
    }

    print_outbox(&notifications);
    Ok(())
}

fn print_outbox(notifications: &InMemoryNotificationDispatcher) {
    let outbox = notifications.outbox();
    if outbox.is_empty() {
        println!("\nBidder notifications: none dispatched");
        return;
    }
    println!("\nBidder notifications");
    for notification in outbox {
        println!(
            "- template={} bid={} -> {}",
            notification.kind.template(),
            notification.bid_id,
            notification.message
        );
    }
}
